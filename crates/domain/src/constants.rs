//! Domain constants

/// Collection holding one document per identity-provider user.
pub const USERS_COLLECTION: &str = "users";

/// Document field names owned by the profile sync handler.
pub mod fields {
    pub const DISPLAY_NAME: &str = "displayName";
    pub const EMAIL: &str = "email";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}
