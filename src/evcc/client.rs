use crate::error::FetchError;
use crate::evcc::state::RawState;
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error as _;
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can produce one evcc state document per call.
#[async_trait]
pub trait StateSource: Send + Sync {
    async fn fetch_state(&self) -> Result<RawState, FetchError>;

    /// Human-readable origin for log lines.
    fn describe(&self) -> String;
}

/// evcc REST API client. One GET per call, no retries: a failed fetch ends
/// the cycle and the next scheduled cycle tries again.
#[derive(Debug, Clone)]
pub struct EvccClient {
    base_url: String,
    client: Client,
}

impl EvccClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, client })
    }

    fn state_url(&self) -> String {
        format!("{}/api/state", self.base_url)
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: self.base_url.clone(),
            }
        } else if err.is_connect() {
            FetchError::Connect {
                url: self.base_url.clone(),
                reason: connect_hint(&err),
            }
        } else {
            FetchError::Http(err)
        }
    }
}

#[async_trait]
impl StateSource for EvccClient {
    async fn fetch_state(&self) -> Result<RawState, FetchError> {
        let url = self.state_url();
        debug!(url = %url, "requesting evcc state");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "evcc API request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        debug!(bytes = body.len(), "received evcc state");

        RawState::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// Turn a connect failure into a hint an operator can act on.
fn connect_hint(err: &reqwest::Error) -> String {
    let mut chain = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    let detail = chain.join(": ");
    let lowered = detail.to_lowercase();

    if lowered.contains("dns")
        || lowered.contains("name or service not known")
        || lowered.contains("nodename nor servname")
        || lowered.contains("failed to lookup address")
    {
        "host not found (check URL)".to_string()
    } else if lowered.contains("connection refused") {
        "connection refused (is evcc running?)".to_string()
    } else if detail.is_empty() {
        err.to_string()
    } else {
        detail
    }
}
