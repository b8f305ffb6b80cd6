use crate::error::DeliveryError;
use crate::snapshot::Snapshot;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// TRMNL custom plugins expect the template variables under `merge_variables`.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub merge_variables: &'a Snapshot,
}

impl<'a> WebhookPayload<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            merge_variables: snapshot,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebhookClient {
    url: String,
    client: Client,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>) -> Result<Self, DeliveryError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// POST the snapshot once. Returns the HTTP status on success.
    pub async fn send(&self, snapshot: &Snapshot) -> Result<u16, DeliveryError> {
        let body = serde_json::to_vec(&WebhookPayload::new(snapshot))?;
        debug!(bytes = body.len(), "webhook payload size");

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evcc::RawState;
    use crate::snapshot::{build_snapshot, BuildOptions};
    use chrono::{TimeZone, Utc};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn snapshot() -> Snapshot {
        let raw = RawState::from_slice(
            br#"{"siteTitle": "Cabin", "homePower": 300, "loadpoints": [{"title": "Shed"}]}"#,
        )
        .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        build_snapshot(&raw, &BuildOptions::default(), now).unwrap()
    }

    #[test]
    fn test_payload_envelope() {
        let snapshot = snapshot();
        let value = serde_json::to_value(WebhookPayload::new(&snapshot)).unwrap();

        assert_eq!(value["merge_variables"]["site_title"], "Cabin");
        assert_eq!(value.as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_send_posts_json() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/custom_plugins/xyz")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "merge_variables": {"site_title": "Cabin", "loadpoint_count": 1}
            })))
            .with_status(200)
            .create_async()
            .await;

        let client = WebhookClient::new(format!("{}/api/custom_plugins/xyz", server.url())).unwrap();
        let status = client.send(&snapshot()).await.unwrap();

        assert_eq!(status, 200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client =
            WebhookClient::with_timeout(format!("http://{}/hook", addr), Duration::from_millis(300))
                .unwrap();
        let result = client.send(&snapshot()).await;

        assert!(
            matches!(&result, Err(DeliveryError::Http(e)) if e.is_timeout()),
            "expected timeout, got {:?}",
            result
        );
        silent.abort();
    }

    #[tokio::test]
    async fn test_send_rejects_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let client = WebhookClient::new(server.url()).unwrap();
        let result = client.send(&snapshot()).await;

        match result {
            Err(DeliveryError::Status { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }
}
