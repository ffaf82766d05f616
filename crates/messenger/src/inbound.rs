//! Inbound webhook wire models and translation helpers.
//!
//! The platform POSTs batches shaped like:
//!
//! ```json
//! { "object": "page",
//!   "entry": [ { "id": "<page>", "time": 1458692752478,
//!                "messaging": [ { "sender": {"id": "..."}, "recipient": {"id": "..."},
//!                                 "timestamp": 1458692752478, "message": { ... } } ] } ] }
//! ```
//!
//! Responsibilities:
//! - Define the domain-level [`InboundEvent`] consumed by the conversation dispatcher
//! - Define lenient wire structs for the platform JSON (the platform adds fields freely, so
//!   unknown keys are ignored rather than rejected)
//! - Translate each messaging item independently, so one malformed item never prevents the
//!   rest of the batch from being handled

use crate::{MessengerError, MessengerResult};
use serde::Deserialize;
use serde_json::Value;

// ============================================================================
// Public domain-level types
// ============================================================================

/// A single messaging event extracted from a webhook delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundEvent {
    /// Page-scoped id of the user who triggered the event.
    pub sender_id: String,

    /// Id of the page that received the event.
    pub recipient_id: String,

    /// Event time in epoch milliseconds.
    pub timestamp: i64,

    /// What happened.
    pub kind: EventKind,
}

/// The variants of messaging event the bot distinguishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// A plain text message typed by the user.
    Text { message_id: String, text: String },

    /// A tap on a quick-reply suggestion.
    QuickReplyTap { message_id: String, payload: String },

    /// A tap on a postback button.
    PostbackTap { title: Option<String>, payload: String },

    /// A message carrying one or more attachments.
    Attachments {
        message_id: String,
        attachments: Vec<Attachment>,
    },

    /// A copy of a message the page itself sent.
    Echo {
        message_id: String,
        app_id: Option<i64>,
        metadata: Option<String>,
    },

    /// "Send to Messenger" opt-in.
    Authentication { pass_through: Option<String> },

    /// Delivery confirmation for previously sent messages.
    DeliveryReceipt {
        message_ids: Vec<String>,
        watermark: i64,
        seq: Option<i64>,
    },

    /// The user read messages up to `watermark`.
    ReadReceipt { watermark: i64, seq: Option<i64> },

    /// Account link or unlink action.
    AccountLink {
        status: String,
        authorization_code: Option<String>,
    },

    /// A message or event shape the bot does not handle.
    Unsupported,
}

/// An attachment on an inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    /// Attachment `type` (`image`, `template`, `fallback`, ...).
    pub kind: String,

    /// `payload.template_type` when the attachment is a template.
    pub template_type: Option<String>,

    /// Developer-defined `payload.payload` string, if present.
    pub payload: Option<String>,

    /// `payload.url` for media attachments.
    pub url: Option<String>,
}

impl Attachment {
    /// Returns the developer payload when this attachment is a button template carrying one.
    pub fn button_payload(&self) -> Option<&str> {
        let is_button_template =
            self.kind == "template" && self.template_type.as_deref() == Some("button");
        if is_button_template {
            self.payload.as_deref()
        } else {
            None
        }
    }
}

// ============================================================================
// Public Webhook operations
// ============================================================================

/// Webhook delivery operations.
///
/// This is a zero-sized type used for namespacing webhook-related operations.
pub struct Webhook;

/// The outcome of parsing one webhook delivery.
#[derive(Debug, Default)]
pub struct Delivery {
    /// The `object` field of the delivery (`"page"` for page subscriptions).
    pub object: String,

    /// Events that translated cleanly, in delivery order.
    pub events: Vec<InboundEvent>,

    /// One message per messaging item that could not be translated.
    pub rejected: Vec<String>,
}

impl Webhook {
    /// Parse a raw webhook delivery body.
    ///
    /// The envelope (`object`, `entry[].messaging`) must be well formed; individual messaging
    /// items are translated independently and failures are collected in
    /// [`Delivery::rejected`] rather than failing the whole delivery.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::InvalidPayload`] if the envelope does not match the expected
    /// shape. The message carries the path of the failing field.
    pub fn parse(body: &[u8]) -> MessengerResult<Delivery> {
        let mut deserializer = serde_json::Deserializer::from_slice(body);
        let envelope: WireDelivery = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|err| {
                let path = err.path().to_string();
                let path = if path == "." { "<root>".to_string() } else { path };
                MessengerError::InvalidPayload(format!(
                    "webhook schema mismatch at {path}: {}",
                    err.into_inner()
                ))
            })?;

        let mut delivery = Delivery {
            object: envelope.object,
            ..Delivery::default()
        };

        for (entry_idx, entry) in envelope.entry.into_iter().enumerate() {
            for (item_idx, item) in entry.messaging.into_iter().enumerate() {
                match Self::event_from_value(item) {
                    Ok(event) => delivery.events.push(event),
                    Err(err) => {
                        let reason = format!("entry[{entry_idx}].messaging[{item_idx}]: {err}");
                        tracing::warn!("skipping messaging item {}", reason);
                        delivery.rejected.push(reason);
                    }
                }
            }
        }

        Ok(delivery)
    }

    /// Translate a single messaging item into an [`InboundEvent`].
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::InvalidPayload`] if the item lacks sender/recipient ids or
    /// one of its recognised sections has the wrong shape.
    pub fn event_from_value(item: Value) -> MessengerResult<InboundEvent> {
        let wire: WireMessaging = serde_path_to_error::deserialize(item).map_err(|err| {
            MessengerError::InvalidPayload(format!("{} at {}", err.inner(), err.path()))
        })?;
        Ok(wire_to_domain(wire))
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
struct WireDelivery {
    object: String,
    #[serde(default)]
    entry: Vec<WireEntry>,
}

#[derive(Debug, Deserialize)]
struct WireEntry {
    #[serde(default)]
    messaging: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct WireId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct WireMessaging {
    sender: WireId,
    recipient: WireId,
    #[serde(default)]
    timestamp: i64,
    optin: Option<WireOptin>,
    message: Option<WireMessage>,
    delivery: Option<WireDeliveryReceipt>,
    postback: Option<WirePostback>,
    read: Option<WireRead>,
    account_linking: Option<WireAccountLinking>,
}

#[derive(Debug, Deserialize)]
struct WireOptin {
    #[serde(rename = "ref")]
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    mid: String,
    #[serde(default)]
    is_echo: bool,
    app_id: Option<i64>,
    metadata: Option<String>,
    text: Option<String>,
    quick_reply: Option<WireQuickReply>,
    attachments: Option<Vec<WireAttachment>>,
}

#[derive(Debug, Deserialize)]
struct WireQuickReply {
    payload: String,
}

#[derive(Debug, Deserialize)]
struct WireAttachment {
    #[serde(rename = "type")]
    kind: String,
    payload: Option<WireAttachmentPayload>,
}

#[derive(Debug, Deserialize)]
struct WireAttachmentPayload {
    template_type: Option<String>,
    payload: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDeliveryReceipt {
    #[serde(default)]
    mids: Vec<String>,
    #[serde(default)]
    watermark: i64,
    seq: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WirePostback {
    title: Option<String>,
    payload: String,
}

#[derive(Debug, Deserialize)]
struct WireRead {
    #[serde(default)]
    watermark: i64,
    seq: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WireAccountLinking {
    status: String,
    authorization_code: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// Convert a wire messaging item to the domain event.
///
/// Section precedence follows the platform callback order: opt-in, message, delivery,
/// postback, read, account linking.
fn wire_to_domain(wire: WireMessaging) -> InboundEvent {
    let kind = if let Some(optin) = wire.optin {
        EventKind::Authentication {
            pass_through: optin.reference,
        }
    } else if let Some(message) = wire.message {
        message_kind(message)
    } else if let Some(delivery) = wire.delivery {
        EventKind::DeliveryReceipt {
            message_ids: delivery.mids,
            watermark: delivery.watermark,
            seq: delivery.seq,
        }
    } else if let Some(postback) = wire.postback {
        EventKind::PostbackTap {
            title: postback.title,
            payload: postback.payload,
        }
    } else if let Some(read) = wire.read {
        EventKind::ReadReceipt {
            watermark: read.watermark,
            seq: read.seq,
        }
    } else if let Some(link) = wire.account_linking {
        EventKind::AccountLink {
            status: link.status,
            authorization_code: link.authorization_code,
        }
    } else {
        EventKind::Unsupported
    };

    InboundEvent {
        sender_id: wire.sender.id,
        recipient_id: wire.recipient.id,
        timestamp: wire.timestamp,
        kind,
    }
}

fn message_kind(message: WireMessage) -> EventKind {
    if message.is_echo {
        return EventKind::Echo {
            message_id: message.mid,
            app_id: message.app_id,
            metadata: message.metadata,
        };
    }

    if let Some(quick_reply) = message.quick_reply {
        return EventKind::QuickReplyTap {
            message_id: message.mid,
            payload: quick_reply.payload,
        };
    }

    if let Some(attachments) = message.attachments.filter(|a| !a.is_empty()) {
        let attachments = attachments
            .into_iter()
            .map(|a| {
                let payload = a.payload;
                Attachment {
                    kind: a.kind,
                    template_type: payload.as_ref().and_then(|p| p.template_type.clone()),
                    url: payload.as_ref().and_then(|p| p.url.clone()),
                    payload: payload.and_then(|p| p.payload),
                }
            })
            .collect();
        return EventKind::Attachments {
            message_id: message.mid,
            attachments,
        };
    }

    match message.text {
        Some(text) => EventKind::Text {
            message_id: message.mid,
            text,
        },
        None => EventKind::Unsupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(section: &str, body: Value) -> Value {
        let mut value = json!({
            "sender": { "id": "USER_1" },
            "recipient": { "id": "PAGE_1" },
            "timestamp": 1_458_692_752_478_i64,
        });
        value[section] = body;
        value
    }

    #[test]
    fn parses_text_message_batch() {
        let body = json!({
            "object": "page",
            "entry": [{
                "id": "PAGE_1",
                "time": 1_458_692_752_478_i64,
                "messaging": [item("message", json!({ "mid": "m1", "text": "hello" }))]
            }]
        });

        let delivery = Webhook::parse(body.to_string().as_bytes()).expect("parse delivery");
        assert_eq!(delivery.object, "page");
        assert!(delivery.rejected.is_empty());
        assert_eq!(
            delivery.events,
            vec![InboundEvent {
                sender_id: "USER_1".into(),
                recipient_id: "PAGE_1".into(),
                timestamp: 1_458_692_752_478,
                kind: EventKind::Text {
                    message_id: "m1".into(),
                    text: "hello".into(),
                },
            }]
        );
    }

    #[test]
    fn malformed_item_does_not_drop_the_rest_of_the_batch() {
        let body = json!({
            "object": "page",
            "entry": [{
                "messaging": [
                    { "recipient": { "id": "PAGE_1" }, "message": { "text": "no sender" } },
                    item("postback", json!({ "title": "Male", "payload": "MALE_PAYLOAD" }))
                ]
            }]
        });

        let delivery = Webhook::parse(body.to_string().as_bytes()).expect("parse delivery");
        assert_eq!(delivery.events.len(), 1);
        assert_eq!(delivery.rejected.len(), 1);
        assert!(delivery.rejected[0].starts_with("entry[0].messaging[0]"));
        assert!(matches!(
            &delivery.events[0].kind,
            EventKind::PostbackTap { payload, .. } if payload == "MALE_PAYLOAD"
        ));
    }

    #[test]
    fn rejects_envelope_without_object() {
        let err = Webhook::parse(br#"{"entry": []}"#).expect_err("should reject envelope");
        match err {
            MessengerError::InvalidPayload(msg) => assert!(msg.contains("object")),
            other => panic!("expected InvalidPayload error, got {other:?}"),
        }
    }

    #[test]
    fn echo_takes_precedence_over_text() {
        let event = Webhook::event_from_value(item(
            "message",
            json!({ "mid": "m2", "is_echo": true, "app_id": 42, "text": "sent by page" }),
        ))
        .expect("translate");
        assert_eq!(
            event.kind,
            EventKind::Echo {
                message_id: "m2".into(),
                app_id: Some(42),
                metadata: None,
            }
        );
    }

    #[test]
    fn quick_reply_takes_precedence_over_text() {
        let event = Webhook::event_from_value(item(
            "message",
            json!({ "mid": "m3", "text": "19-40", "quick_reply": { "payload": "AGE_3_PAYLOAD" } }),
        ))
        .expect("translate");
        assert_eq!(
            event.kind,
            EventKind::QuickReplyTap {
                message_id: "m3".into(),
                payload: "AGE_3_PAYLOAD".into(),
            }
        );
    }

    #[test]
    fn button_payload_requires_button_template() {
        let event = Webhook::event_from_value(item(
            "message",
            json!({ "mid": "m4", "attachments": [
                { "type": "template", "payload": { "template_type": "button", "payload": "BACK_PAYLOAD" } },
                { "type": "template", "payload": { "template_type": "generic", "payload": "MALE_PAYLOAD" } },
                { "type": "image", "payload": { "url": "https://example.com/a.png" } }
            ] }),
        ))
        .expect("translate");

        let EventKind::Attachments { attachments, .. } = event.kind else {
            panic!("expected attachments");
        };
        assert_eq!(attachments[0].button_payload(), Some("BACK_PAYLOAD"));
        assert_eq!(attachments[1].button_payload(), None);
        assert_eq!(attachments[2].button_payload(), None);
        assert_eq!(attachments[2].url.as_deref(), Some("https://example.com/a.png"));
    }

    #[test]
    fn translates_receipts_and_account_linking() {
        let delivery = Webhook::event_from_value(item(
            "delivery",
            json!({ "mids": ["m1", "m2"], "watermark": 10, "seq": 3 }),
        ))
        .expect("translate");
        assert_eq!(
            delivery.kind,
            EventKind::DeliveryReceipt {
                message_ids: vec!["m1".into(), "m2".into()],
                watermark: 10,
                seq: Some(3),
            }
        );

        let read = Webhook::event_from_value(item("read", json!({ "watermark": 11 })))
            .expect("translate");
        assert_eq!(
            read.kind,
            EventKind::ReadReceipt {
                watermark: 11,
                seq: None
            }
        );

        let link = Webhook::event_from_value(item(
            "account_linking",
            json!({ "status": "linked", "authorization_code": "abc" }),
        ))
        .expect("translate");
        assert_eq!(
            link.kind,
            EventKind::AccountLink {
                status: "linked".into(),
                authorization_code: Some("abc".into()),
            }
        );

        let optin = Webhook::event_from_value(item("optin", json!({ "ref": "PASS_THROUGH" })))
            .expect("translate");
        assert_eq!(
            optin.kind,
            EventKind::Authentication {
                pass_through: Some("PASS_THROUGH".into())
            }
        );
    }

    #[test]
    fn item_without_known_section_is_unsupported() {
        let event = Webhook::event_from_value(json!({
            "sender": { "id": "USER_1" },
            "recipient": { "id": "PAGE_1" },
            "timestamp": 1,
            "reaction": { "emoji": "+1" }
        }))
        .expect("translate");
        assert_eq!(event.kind, EventKind::Unsupported);
    }
}
