//! Outbound Send API message models and wire serialisation.
//!
//! Domain-level messages are addressed to a single recipient and describe *what* to show. The
//! Send API expects a specific JSON shape (`recipient`, `message` with `attachment` or
//! `quick_replies`, or a bare `sender_action`); [`OutboundMessage::to_send_request`] performs
//! that translation.

use crate::MessengerResult;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// Public domain-level types
// ============================================================================

/// A message the bot wants delivered to one user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Page-scoped id of the user to deliver to.
    pub recipient_id: String,

    /// The content of the message.
    pub body: OutboundBody,
}

/// The content variants the bot sends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundBody {
    /// Plain text, optionally tagged with developer metadata.
    Text {
        text: String,
        metadata: Option<String>,
    },

    /// Text with tappable quick-reply suggestions.
    QuickReplyText {
        text: String,
        metadata: Option<String>,
        quick_replies: Vec<QuickReply>,
    },

    /// Button template: prompt text plus up to three buttons.
    ButtonTemplate { text: String, buttons: Vec<Button> },

    /// Generic (carousel) template.
    GenericTemplate { elements: Vec<GenericElement> },

    /// Typing indicator or read receipt.
    SenderAction(SenderAction),

    /// Button template with a single account-link call to action.
    AccountLinkTemplate { text: String, url: String },
}

/// A template button.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Button {
    /// Reports `payload` back to the webhook as a postback.
    Postback { title: String, payload: String },
    /// Opens `url` in the in-app browser.
    WebUrl { title: String, url: String },
    /// Starts the account-linking flow at `url`.
    AccountLink { url: String },
}

/// A quick-reply suggestion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuickReply {
    pub title: String,
    pub payload: String,
}

/// One card in a generic template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenericElement {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub buttons: Vec<Button>,
}

/// Sender actions supported by the Send API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    TypingOn,
    TypingOff,
    MarkSeen,
}

impl OutboundMessage {
    /// Returns the visible text of text-like messages, `None` for templates and actions.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            OutboundBody::Text { text, .. } | OutboundBody::QuickReplyText { text, .. } => {
                Some(text)
            }
            _ => None,
        }
    }

    /// Translate this message into the Send API request body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MessengerError::InvalidJson`] if serialisation fails.
    pub fn to_send_request(&self) -> MessengerResult<Value> {
        let wire = domain_to_wire(self);
        Ok(serde_json::to_value(&wire)?)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Serialize)]
struct WireSendRequest<'a> {
    recipient: WireRecipient<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender_action: Option<SenderAction>,
}

#[derive(Debug, Serialize)]
struct WireRecipient<'a> {
    id: &'a str,
}

#[derive(Debug, Default, Serialize)]
struct WireMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quick_replies: Option<Vec<WireQuickReply<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment: Option<WireAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct WireQuickReply<'a> {
    content_type: &'static str,
    title: &'a str,
    payload: &'a str,
}

#[derive(Debug, Serialize)]
struct WireAttachment<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    payload: WireTemplate<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "template_type", rename_all = "snake_case")]
enum WireTemplate<'a> {
    Button {
        text: &'a str,
        buttons: Vec<Button>,
    },
    Generic {
        elements: &'a [GenericElement],
    },
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn template(payload: WireTemplate<'_>) -> WireMessage<'_> {
    WireMessage {
        attachment: Some(WireAttachment {
            kind: "template",
            payload,
        }),
        ..WireMessage::default()
    }
}

fn domain_to_wire(msg: &OutboundMessage) -> WireSendRequest<'_> {
    let recipient = WireRecipient {
        id: &msg.recipient_id,
    };

    let (message, sender_action) = match &msg.body {
        OutboundBody::Text { text, metadata } => (
            Some(WireMessage {
                text: Some(text),
                metadata: metadata.as_deref(),
                ..WireMessage::default()
            }),
            None,
        ),
        OutboundBody::QuickReplyText {
            text,
            metadata,
            quick_replies,
        } => (
            Some(WireMessage {
                text: Some(text),
                metadata: metadata.as_deref(),
                quick_replies: Some(
                    quick_replies
                        .iter()
                        .map(|q| WireQuickReply {
                            content_type: "text",
                            title: &q.title,
                            payload: &q.payload,
                        })
                        .collect(),
                ),
                ..WireMessage::default()
            }),
            None,
        ),
        OutboundBody::ButtonTemplate { text, buttons } => (
            Some(template(WireTemplate::Button {
                text,
                buttons: buttons.clone(),
            })),
            None,
        ),
        OutboundBody::GenericTemplate { elements } => {
            (Some(template(WireTemplate::Generic { elements })), None)
        }
        OutboundBody::AccountLinkTemplate { text, url } => (
            Some(template(WireTemplate::Button {
                text,
                buttons: vec![Button::AccountLink { url: url.clone() }],
            })),
            None,
        ),
        OutboundBody::SenderAction(action) => (None, Some(*action)),
    };

    WireSendRequest {
        recipient,
        message,
        sender_action,
    }
}
