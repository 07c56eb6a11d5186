//! HTTP document store client
//!
//! Talks to a remote document service over JSON/REST:
//!
//! - `GET   {base}/v1/collections/{collection}/documents/{key}` returns the
//!   document object, or `404` when it does not exist.
//! - `PATCH {base}/v1/collections/{collection}/documents/{key}` with
//!   `{"fields": {...}, "serverTimestamps": ["updatedAt", ...]}` creates the
//!   document or merges the named fields; the service stamps the listed
//!   fields with its own commit time.

use async_trait::async_trait;
use profilesync_core::DocumentStore;
use profilesync_domain::{DocumentFields, ProfileSyncError, Result, StoreConfig, UserDocument};
use reqwest::{Method, Response, StatusCode, Url};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{status_error, InfraError};
use crate::http::HttpClient;

/// Request body of a `PATCH`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PatchBody<'a> {
    fields: Map<String, Value>,
    server_timestamps: Vec<&'a str>,
}

/// REST implementation of `DocumentStore`
pub struct HttpDocumentStore {
    client: HttpClient,
    base_url: Url,
}

impl HttpDocumentStore {
    /// # Errors
    /// Returns `ProfileSyncError::Config` when `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(client: HttpClient, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ProfileSyncError::Config(format!("invalid store base URL: {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ProfileSyncError::Config(format!(
                "store base URL must be http(s): {base_url}"
            )));
        }
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let base_url = config.base_url.as_deref().ok_or_else(|| {
            ProfileSyncError::Config("store.base_url is required for http backend".into())
        })?;
        Self::new(HttpClient::from_store_config(config)?, base_url)
    }

    fn document_url(&self, collection: &str, key: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProfileSyncError::Config("store base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(["v1", "collections", collection, "documents", key]);
        Ok(url)
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<UserDocument>> {
        let url = self.document_url(collection, key)?;
        let response = self.client.send(self.client.request(Method::GET, url)).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: Map<String, Value> =
                    response.json().await.map_err(|e| ProfileSyncError::from(InfraError::from(e)))?;
                Ok(Some(UserDocument::from_json(body)))
            }
            _ => Err(failure(response).await),
        }
    }

    async fn set(&self, collection: &str, key: &str, fields: DocumentFields) -> Result<()> {
        let url = self.document_url(collection, key)?;
        let body = PatchBody {
            fields: fields.concrete_fields(),
            server_timestamps: fields.server_timestamp_fields(),
        };

        let response =
            self.client.send(self.client.request(Method::PATCH, url).json(&body)).await?;

        if response.status().is_success() {
            debug!(collection, key, fields = fields.len(), "document written");
            Ok(())
        } else {
            Err(failure(response).await)
        }
    }
}

async fn failure(response: Response) -> ProfileSyncError {
    let status = response.status();
    let detail = response.text().await.unwrap_or_default();
    status_error(status, detail.trim())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn store_for(server: &MockServer) -> HttpDocumentStore {
        let client = HttpClient::builder().bearer_token("t0ken").build().unwrap();
        HttpDocumentStore::new(client, &server.uri()).unwrap()
    }

    #[tokio::test]
    async fn get_decodes_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/collections/users/documents/u1"))
            .and(header("authorization", "Bearer t0ken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "displayName": "Alicia",
                "email": "a@x.com",
                "createdAt": "2024-05-01T12:00:00Z",
                "updatedAt": "2024-05-01T12:00:00Z",
                "nickname": "Ali"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let doc = store_for(&server).await.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.display_name.as_deref(), Some("Alicia"));
        assert_eq!(doc.extra["nickname"], json!("Ali"));
    }

    #[tokio::test]
    async fn get_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

        assert!(store_for(&server).await.get("users", "ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = store_for(&server).await.get("users", "u1").await.unwrap_err();
        assert!(matches!(err, ProfileSyncError::Unavailable(msg) if msg.contains("maintenance")));
    }

    #[tokio::test]
    async fn set_sends_fields_and_timestamp_names() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1/collections/users/documents/u1"))
            .and(body_json(json!({
                "fields": { "displayName": "Alicia" },
                "serverTimestamps": ["updatedAt"]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server)
            .await
            .set(
                "users",
                "u1",
                DocumentFields::new().set("displayName", "Alicia").server_timestamp("updatedAt"),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn set_forbidden_is_permission_denied() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH")).respond_with(ResponseTemplate::new(403)).mount(&server).await;

        let err = store_for(&server)
            .await
            .set("users", "u1", DocumentFields::new().set("displayName", "A"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileSyncError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn set_precondition_failed_is_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH")).respond_with(ResponseTemplate::new(412)).mount(&server).await;

        let err = store_for(&server)
            .await
            .set("users", "u1", DocumentFields::new().set("displayName", "A"))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn document_url_escapes_segments() {
        let client = HttpClient::builder().build().unwrap();
        let store = HttpDocumentStore::new(client, "https://docs.example.com/api/").unwrap();
        let url = store.document_url("users", "a/b c").unwrap();
        assert_eq!(
            url.as_str(),
            "https://docs.example.com/api/v1/collections/users/documents/a%2Fb%20c"
        );
    }

    #[test]
    fn rejects_non_http_base_url() {
        let client = HttpClient::builder().build().unwrap();
        let result = HttpDocumentStore::new(client, "mailto:ops@example.com");
        assert!(matches!(result, Err(ProfileSyncError::Config(_))));
    }
}
