//! HTTP client for the factory MAC allocation service.
//!
//! `GET {base}/api/v1/mac/uuid?model=<model>` answers with
//! `{"uuid": "<36-character record>"}`. Each successful call consumes an
//! address from the factory pool, so it is only issued from the
//! provisioning path.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::MacAllocator;
use crate::error::HardwareError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct AllocationResponse {
    uuid: String,
}

pub struct MacServerClient {
    client: reqwest::Client,
    base_url: String,
}

impl MacServerClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, HardwareError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MacAllocator for MacServerClient {
    async fn allocate(&self, model: &str) -> Result<String, HardwareError> {
        let response = self
            .client
            .get(format!("{}/api/v1/mac/uuid", self.base_url))
            .query(&[("model", model)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(HardwareError::AllocatorStatus {
                status: status.as_u16(),
                body,
            });
        }

        let allocation: AllocationResponse = response.json().await?;
        tracing::info!(model, uuid = %allocation.uuid, "MAC record allocated");
        Ok(allocation.uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = MacServerClient::with_client(reqwest::Client::new(), "http://mac.local:8080/");
        assert_eq!(client.base_url, "http://mac.local:8080");
    }

    #[test]
    fn allocation_response_parses() {
        let parsed: AllocationResponse =
            serde_json::from_str(r#"{"uuid":"6b1c5a2e-1f3d-4a7b-9c0d-001e06a1b2c3"}"#).unwrap();
        assert!(parsed.uuid.ends_with("001e06a1b2c3"));
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error() {
        // Port 9 (discard) on localhost is closed on test hosts.
        let client = MacServerClient::new("http://127.0.0.1:9").unwrap();
        assert!(client.allocate("m1s").await.is_err());
    }
}
