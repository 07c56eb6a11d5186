use std::time::Duration;

use profilesync_domain::{ProfileSyncError, StoreConfig};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::errors::InfraError;

/// Longest pause between two attempts, whatever the server asks for.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// HTTP client for the document service.
///
/// A request is re-sent only while the service could still accept it:
/// connection failures, timeouts, `429` and `5xx`. A `Retry-After` header
/// (in seconds) takes precedence over the client's own backoff.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Build a client from the `store` section of the configuration.
    pub fn from_store_config(config: &StoreConfig) -> Result<Self, ProfileSyncError> {
        let mut builder = Self::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .max_attempts(config.max_attempts);
        if let Some(token) = &config.api_token {
            builder = builder.bearer_token(token.clone());
        }
        builder.build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send `builder`, re-sending it up to `max_attempts` times in total.
    ///
    /// The last response is returned as-is, even when its status is an
    /// error; only transport failures become `Err`.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ProfileSyncError> {
        let mut attempt = 1;

        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| {
                    ProfileSyncError::Internal("request body cannot be re-sent".into())
                })?
                .build()
                .map_err(|err| ProfileSyncError::from(InfraError::from(err)))?;
            let (method, url) = (request.method().clone(), request.url().clone());

            let result = self.client.execute(request).await;
            let delay = match &result {
                Ok(response) if is_retryable_status(response.status()) => {
                    Some(retry_after(response).unwrap_or_else(|| self.backoff(attempt)))
                }
                Err(err) if err.is_connect() || err.is_timeout() => Some(self.backoff(attempt)),
                _ => None,
            };

            match delay {
                Some(delay) if attempt < self.max_attempts => {
                    let delay = delay.min(MAX_RETRY_DELAY);
                    debug!(
                        attempt,
                        %method,
                        %url,
                        delay_ms = delay.as_millis() as u64,
                        "re-sending store request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                _ => return result.map_err(|err| InfraError::from(err).into()),
            }
        }
    }

    /// `base_backoff * 2^(attempt - 1)`.
    fn backoff(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(8) as u32;
        self.base_backoff.saturating_mul(2u32.pow(exponent))
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_after(response: &Response) -> Option<Duration> {
    let seconds = response.headers().get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_secs(seconds))
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    bearer_token: Option<String>,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 1,
            base_backoff: Duration::from_millis(200),
            bearer_token: None,
            user_agent: concat!("profilesync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, ProfileSyncError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.bearer_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ProfileSyncError::Config("api token contains invalid header characters".into())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .default_headers(headers)
            .no_proxy()
            .build()
            .map_err(|err| ProfileSyncError::from(InfraError::from(err)))?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}
