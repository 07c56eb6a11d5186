//! Conversions from external infrastructure errors into domain errors.

use profilesync_domain::ProfileSyncError;
use reqwest::{Error as HttpError, StatusCode};
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ProfileSyncError);

impl From<InfraError> for ProfileSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ProfileSyncError> for InfraError {
    fn from(value: ProfileSyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoProfileSyncError {
    fn into_profilesync(self) -> ProfileSyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → ProfileSyncError */
/* -------------------------------------------------------------------------- */

impl IntoProfileSyncError for SqlError {
    fn into_profilesync(self) -> ProfileSyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => {
                        ProfileSyncError::Unavailable("database is busy".into())
                    }
                    ErrorCode::DatabaseLocked => {
                        ProfileSyncError::Unavailable("database is locked".into())
                    }
                    ErrorCode::ReadOnly | ErrorCode::PermissionDenied => {
                        ProfileSyncError::PermissionDenied(format!("sqlite: {message}"))
                    }
                    ErrorCode::CannotOpen => {
                        ProfileSyncError::Unavailable(format!("cannot open database: {message}"))
                    }
                    ErrorCode::ConstraintViolation => {
                        ProfileSyncError::Conflict(format!("constraint violation: {message}"))
                    }
                    _ => ProfileSyncError::Store(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                ProfileSyncError::NotFound("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                ProfileSyncError::Store(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                ProfileSyncError::Store(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => ProfileSyncError::Config(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => ProfileSyncError::Store(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_profilesync())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → ProfileSyncError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(ProfileSyncError::Unavailable(format!("connection pool: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ProfileSyncError */
/* -------------------------------------------------------------------------- */

impl IntoProfileSyncError for HttpError {
    fn into_profilesync(self) -> ProfileSyncError {
        if self.is_timeout() {
            return ProfileSyncError::Unavailable("HTTP request timed out".into());
        }

        if self.is_connect() {
            return ProfileSyncError::Unavailable("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return status_error(status, "");
        }

        if self.is_decode() {
            return ProfileSyncError::Store(format!("undecodable response body: {self}"));
        }

        ProfileSyncError::Unavailable(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_profilesync())
    }
}

/// Map a non-success HTTP status from the document service.
pub fn status_error(status: StatusCode, detail: &str) -> ProfileSyncError {
    let code = status.as_u16();
    let mut message = format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
    if !detail.is_empty() {
        message.push_str(": ");
        message.push_str(detail);
    }

    match code {
        401 | 403 => ProfileSyncError::PermissionDenied(message),
        404 => ProfileSyncError::NotFound(message),
        409 | 412 => ProfileSyncError::Conflict(message),
        429 => ProfileSyncError::Unavailable(message),
        400..=499 => ProfileSyncError::InvalidInput(message),
        _ => ProfileSyncError::Unavailable(message),
    }
}

/* -------------------------------------------------------------------------- */
/* Misc runtime errors */
/* -------------------------------------------------------------------------- */

impl From<tokio::task::JoinError> for InfraError {
    fn from(value: tokio::task::JoinError) -> Self {
        InfraError(ProfileSyncError::Internal(format!("blocking task failed: {value}")))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(ProfileSyncError::Store(format!("invalid document JSON: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
