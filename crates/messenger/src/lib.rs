//! Messenger Platform wire/boundary support for the symptom-checker bot.
//!
//! This crate provides **wire models** and **translation helpers** for the two directions of the
//! Messenger Platform webhook integration:
//! - inbound webhook deliveries (`object: "page"` batches of messaging events)
//! - outbound Send API requests (text, templates, quick replies, sender actions)
//!
//! This crate focuses on:
//! - serialisation/deserialisation of the platform JSON
//! - translation between platform wire structs and the bot's domain events/messages
//! - pure builders for the outbound messages the conversation flow needs
//!
//! It performs no I/O. Sending and receiving over HTTP belongs to `symbot-core` and `api-rest`.

pub mod builder;
pub mod inbound;
pub mod outbound;

// Re-export facades
pub use inbound::Webhook;

// Re-export public domain-level types
pub use inbound::{Attachment, Delivery, EventKind, InboundEvent};
pub use outbound::{
    Button, GenericElement, OutboundBody, OutboundMessage, QuickReply, SenderAction,
};

/// Errors returned by the `messenger` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Type alias for Results that can fail with a [`MessengerError`].
pub type MessengerResult<T> = Result<T, MessengerError>;
