//! Heartbeat transport.
//!
//! [`HeartbeatSink`] is the seam between the flush logic and the network:
//! the service only knows it hands a request to a sink and gets a
//! [`DeliveryOutcome`] back. [`HttpSink`] is the production implementation
//! over reqwest; tests substitute recording sinks.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::Result;

use super::HeartbeatRequest;

/// Bound on a single heartbeat POST so a stalled network call cannot pile
/// up behind the ticker.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Terminal classification of one heartbeat delivery attempt.
///
/// Every variant is final: heartbeats are best-effort telemetry, so none of
/// these triggers a retry. The next flush with pending activity is the
/// natural re-attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 2xx status.
    Accepted(u16),
    /// 401: bad or missing token. Singled out because it means
    /// misconfiguration, not a transient fault.
    AuthRejected(String),
    /// Any other non-2xx status, with body for diagnostics.
    Rejected { code: u16, body: String },
    /// Request could not be sent or no response arrived.
    TransportFailed(String),
}

impl DeliveryOutcome {
    /// Classify an HTTP status code and response body.
    pub fn from_status(code: u16, body: String) -> Self {
        match code {
            200..=299 => DeliveryOutcome::Accepted(code),
            401 => DeliveryOutcome::AuthRejected(body),
            _ => DeliveryOutcome::Rejected { code, body },
        }
    }

    /// Log this outcome. Infallible and state-free: delivery results never
    /// feed back into the aggregator.
    pub fn report(&self) {
        match self {
            DeliveryOutcome::Accepted(code) => {
                info!("Heartbeat accepted with code {}", code);
            }
            DeliveryOutcome::AuthRejected(body) => {
                error!(
                    "Heartbeat failed due to invalid API token (401). Response: {}",
                    body
                );
            }
            DeliveryOutcome::Rejected { code, body } => {
                error!("Heartbeat failed. Code: {}. Response: {}", code, body);
            }
            DeliveryOutcome::TransportFailed(reason) => {
                error!("Failed to reach heartbeat endpoint: {}", reason);
            }
        }
    }
}

/// Anything that can deliver a heartbeat request.
#[async_trait]
pub trait HeartbeatSink: Send + Sync {
    async fn send(&self, request: HeartbeatRequest) -> DeliveryOutcome;
}

/// Production sink: POSTs the heartbeat over HTTPS.
pub struct HttpSink {
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HeartbeatSink for HttpSink {
    async fn send(&self, request: HeartbeatRequest) -> DeliveryOutcome {
        let response = self
            .client
            .post(&request.url)
            .header("User-Agent", &request.user_agent)
            .bearer_auth(&request.bearer_token)
            // .json() sets Content-Type: application/json.
            .json(&request.body)
            .send()
            .await;

        match response {
            Ok(resp) => {
                let code = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                DeliveryOutcome::from_status(code, body)
            }
            Err(e) => DeliveryOutcome::TransportFailed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_2xx_accepted() {
        assert_eq!(
            DeliveryOutcome::from_status(200, String::new()),
            DeliveryOutcome::Accepted(200)
        );
        assert_eq!(
            DeliveryOutcome::from_status(201, String::new()),
            DeliveryOutcome::Accepted(201)
        );
        assert_eq!(
            DeliveryOutcome::from_status(299, String::new()),
            DeliveryOutcome::Accepted(299)
        );
    }

    #[test]
    fn test_401_is_auth_rejection() {
        let outcome = DeliveryOutcome::from_status(401, "bad token".to_string());
        assert_eq!(outcome, DeliveryOutcome::AuthRejected("bad token".to_string()));
    }

    #[test]
    fn test_other_statuses_are_rejections() {
        let outcome = DeliveryOutcome::from_status(500, "boom".to_string());
        assert_eq!(
            outcome,
            DeliveryOutcome::Rejected {
                code: 500,
                body: "boom".to_string()
            }
        );
        assert!(matches!(
            DeliveryOutcome::from_status(400, String::new()),
            DeliveryOutcome::Rejected { code: 400, .. }
        ));
        assert!(matches!(
            DeliveryOutcome::from_status(301, String::new()),
            DeliveryOutcome::Rejected { code: 301, .. }
        ));
    }

    #[test]
    fn test_three_failure_classes_are_distinct() {
        let auth = DeliveryOutcome::from_status(401, String::new());
        let server = DeliveryOutcome::from_status(500, String::new());
        let transport = DeliveryOutcome::TransportFailed("connection refused".to_string());
        assert_ne!(auth, server);
        assert_ne!(auth, transport);
        assert_ne!(server, transport);
    }
}
