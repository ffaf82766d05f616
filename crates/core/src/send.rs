//! Send API delivery.

use crate::SendError;
use async_trait::async_trait;
use messenger::OutboundMessage;
use serde::Deserialize;

/// Acknowledgement returned by the Send API.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SendReceipt {
    pub recipient_id: String,
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Outbound delivery capability.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Deliver one message. Retrying is left to the implementation.
    async fn send(&self, message: &OutboundMessage) -> Result<SendReceipt, SendError>;
}

/// [`MessageSender`] that POSTs to the Graph API `me/messages` endpoint.
#[derive(Clone)]
pub struct GraphSendClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl GraphSendClient {
    /// `graph_api_url` is the versioned Graph base, e.g. `https://graph.facebook.com/v2.6`.
    pub fn new(
        http: reqwest::Client,
        graph_api_url: &str,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: format!("{}/me/messages", graph_api_url.trim_end_matches('/')),
            access_token: access_token.into(),
        }
    }
}

#[async_trait]
impl MessageSender for GraphSendClient {
    async fn send(&self, message: &OutboundMessage) -> Result<SendReceipt, SendError> {
        let body = message.to_send_request()?;

        let resp = self
            .http
            .post(&self.endpoint)
            .query(&[("access_token", self.access_token.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!("send API error {}: {}", status, body);
            return Err(SendError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let receipt: SendReceipt = resp
            .json()
            .await
            .map_err(|e| SendError::InvalidResponse(e.to_string()))?;
        tracing::debug!(
            "delivered message {:?} to {}",
            receipt.message_id,
            receipt.recipient_id
        );
        Ok(receipt)
    }
}
