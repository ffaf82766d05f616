//! # Symbot Core
//!
//! Conversation logic for the symptom checker chatbot.
//!
//! This crate turns inbound Messenger events into outbound replies:
//! - Free-text, postback and attachment routing ([`dispatch`])
//! - Symptom checker queries with a bounded timeout ([`lookup`])
//! - Diagnosis document parsing and card rendering ([`parser`], [`render`])
//! - Delivery through the Send API ([`send`])
//!
//! **No HTTP server concerns**: signature checks and the webhook routes belong in
//! `api-shared` and `api-rest`.

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod lookup;
pub mod parser;
pub mod payload;
pub mod prompts;
pub mod render;
pub mod send;
pub mod validation;

pub use config::{BotConfig, Gender, LookupConfig};
pub use dispatch::{intent_for, ConversationIntent, Dispatcher};
pub use error::{ConfigError, ConfigResult, HttpError, LookupError, ParseError, SendError};
pub use lookup::{DiagnosisLookupClient, DiagnosisQuery, HttpFetch, ReqwestFetcher};
pub use parser::{parse_diagnoses, ConditionRecord};
pub use render::render_diagnoses;
pub use send::{GraphSendClient, MessageSender, SendReceipt};

use messenger::{InboundEvent, OutboundMessage};
use std::sync::Arc;

/// Dispatches inbound events and delivers the replies.
#[derive(Clone)]
pub struct BotService {
    dispatcher: Dispatcher,
    sender: Arc<dyn MessageSender>,
}

impl BotService {
    pub fn new(dispatcher: Dispatcher, sender: Arc<dyn MessageSender>) -> Self {
        Self { dispatcher, sender }
    }

    /// Build the production service from resolved configuration.
    pub fn from_config(cfg: &BotConfig, http: reqwest::Client) -> Self {
        let fetcher = Arc::new(ReqwestFetcher::with_client(http.clone()));
        let lookup = DiagnosisLookupClient::new(cfg.lookup().clone(), fetcher);
        let sender = GraphSendClient::new(http, cfg.graph_api_url(), cfg.page_access_token());
        Self::new(
            Dispatcher::new(cfg.server_url(), lookup),
            Arc::new(sender),
        )
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle one event: decide the replies, then send them in order.
    ///
    /// Send failures are logged and the remaining replies are still attempted. Returns the
    /// replies that were decided, whether or not delivery succeeded.
    pub async fn handle_inbound_event(&self, event: InboundEvent) -> Vec<OutboundMessage> {
        let replies = self.dispatcher.dispatch(&event).await;

        for reply in &replies {
            if let Err(e) = self.sender.send(reply).await {
                tracing::error!("failed to send reply to {}: {}", reply.recipient_id, e);
            }
        }

        replies
    }

    /// Handle a webhook batch. Events are processed one after another.
    pub async fn handle_delivery(&self, events: Vec<InboundEvent>) {
        let count = events.len();
        for event in events {
            self.handle_inbound_event(event).await;
        }
        tracing::debug!("processed {} messaging event(s)", count);
    }
}
