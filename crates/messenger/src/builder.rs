//! Pure constructors for outbound messages.
//!
//! These helpers only assemble [`OutboundMessage`] values; they never perform I/O.

use crate::outbound::{
    Button, GenericElement, OutboundBody, OutboundMessage, QuickReply, SenderAction,
};

/// Plain text message.
pub fn text(recipient_id: &str, text: impl Into<String>) -> OutboundMessage {
    OutboundMessage {
        recipient_id: recipient_id.to_owned(),
        body: OutboundBody::Text {
            text: text.into(),
            metadata: None,
        },
    }
}

/// Plain text message tagged with developer metadata.
pub fn text_with_metadata(
    recipient_id: &str,
    text: impl Into<String>,
    metadata: impl Into<String>,
) -> OutboundMessage {
    OutboundMessage {
        recipient_id: recipient_id.to_owned(),
        body: OutboundBody::Text {
            text: text.into(),
            metadata: Some(metadata.into()),
        },
    }
}

/// Text message with quick-reply suggestions given as `(title, payload)` pairs.
pub fn quick_replies(
    recipient_id: &str,
    text: impl Into<String>,
    metadata: Option<String>,
    replies: &[(&str, &str)],
) -> OutboundMessage {
    OutboundMessage {
        recipient_id: recipient_id.to_owned(),
        body: OutboundBody::QuickReplyText {
            text: text.into(),
            metadata,
            quick_replies: replies
                .iter()
                .map(|(title, payload)| QuickReply {
                    title: (*title).to_owned(),
                    payload: (*payload).to_owned(),
                })
                .collect(),
        },
    }
}

/// Button template whose buttons are all postbacks given as `(title, payload)` pairs.
pub fn postback_buttons(
    recipient_id: &str,
    text: impl Into<String>,
    buttons: &[(&str, &str)],
) -> OutboundMessage {
    OutboundMessage {
        recipient_id: recipient_id.to_owned(),
        body: OutboundBody::ButtonTemplate {
            text: text.into(),
            buttons: buttons
                .iter()
                .map(|(title, payload)| postback(*title, *payload))
                .collect(),
        },
    }
}

/// Generic template from prepared elements.
pub fn generic(recipient_id: &str, elements: Vec<GenericElement>) -> OutboundMessage {
    OutboundMessage {
        recipient_id: recipient_id.to_owned(),
        body: OutboundBody::GenericTemplate { elements },
    }
}

/// Typing indicator or read receipt.
pub fn sender_action(recipient_id: &str, action: SenderAction) -> OutboundMessage {
    OutboundMessage {
        recipient_id: recipient_id.to_owned(),
        body: OutboundBody::SenderAction(action),
    }
}

/// Account-linking call to action pointing at `url`.
pub fn account_link(
    recipient_id: &str,
    text: impl Into<String>,
    url: impl Into<String>,
) -> OutboundMessage {
    OutboundMessage {
        recipient_id: recipient_id.to_owned(),
        body: OutboundBody::AccountLinkTemplate {
            text: text.into(),
            url: url.into(),
        },
    }
}

/// Postback button.
pub fn postback(title: impl Into<String>, payload: impl Into<String>) -> Button {
    Button::Postback {
        title: title.into(),
        payload: payload.into(),
    }
}

/// Web link button.
pub fn web_url(title: impl Into<String>, url: impl Into<String>) -> Button {
    Button::WebUrl {
        title: title.into(),
        url: url.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postback_buttons_keep_order() {
        let msg = postback_buttons("U", "Pick one", &[("A", "A_PAYLOAD"), ("B", "B_PAYLOAD")]);
        assert_eq!(msg.recipient_id, "U");
        match msg.body {
            OutboundBody::ButtonTemplate { text, buttons } => {
                assert_eq!(text, "Pick one");
                assert_eq!(
                    buttons,
                    vec![postback("A", "A_PAYLOAD"), postback("B", "B_PAYLOAD")]
                );
            }
            other => panic!("expected button template, got {other:?}"),
        }
    }

    #[test]
    fn text_helper_exposes_text() {
        assert_eq!(text("U", "hi").text(), Some("hi"));
        assert_eq!(sender_action("U", SenderAction::TypingOn).text(), None);
    }
}
