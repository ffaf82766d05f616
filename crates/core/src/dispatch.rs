//! Conversation dispatch.
//!
//! Each inbound event is handled on its own: [`intent_for`] classifies the event into a
//! [`ConversationIntent`] without side effects, and [`Dispatcher::respond`] turns the intent
//! into the replies to send, calling the symptom checker when the intent is a lookup.
//!
//! Routing priority for messages: echo, quick reply, attachments, free text. Postbacks and
//! button-template attachment payloads share one payload switch.

use crate::constants::{
    ATTACHMENT_ACK, AUTHENTICATION_ACK, DEFAULT_METADATA, LOOKUP_APOLOGY, MORE_INFO_LEGEND,
    NO_CONDITIONS_FOUND, QUICK_REPLY_ACK, UNRECOGNISED_ATTACHMENT_PAYLOAD,
    UNRECOGNISED_POSTBACK,
};
use crate::lookup::{DiagnosisLookupClient, DiagnosisQuery};
use crate::parser::parse_diagnoses;
use crate::payload::{Payload, PayloadTag};
use crate::prompts;
use crate::render::render_diagnoses;
use chrono::{DateTime, NaiveDate};
use messenger::{builder, EventKind, InboundEvent, OutboundMessage, SenderAction};

/// How the age question is asked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgeStyle {
    Buttons,
    QuickReply,
}

/// Where an unrecognised payload came from; the fallback reply differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadSource {
    Postback,
    Attachment,
}

/// What the bot should do in response to one event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConversationIntent {
    GenderPrompt,
    PregnancyPrompt,
    AgePrompt(AgeStyle),
    SymptomQueryPrompt,
    DateOfBirthPrompt,
    /// Explain the card tags. The detail after `MORE_INFO_` does not change the reply.
    MoreInfoDetail(String),
    /// The user typed a date: echo it, then ask for symptoms.
    DateOfBirthAnswer(NaiveDate),
    /// The user typed a comma-separated symptom list.
    SymptomLookup(String),
    Echo(String),
    ReadReceipt,
    TypingOn,
    TypingOff,
    AccountLinking,
    QuickReplyAck,
    AttachmentAck,
    UnrecognisedPayload(PayloadSource),
    AuthenticationAck,
    /// No reply.
    Ignore,
}

/// Classify an inbound event.
pub fn intent_for(event: &InboundEvent) -> ConversationIntent {
    match &event.kind {
        EventKind::Echo { .. } => ConversationIntent::Ignore,
        EventKind::QuickReplyTap { .. } => ConversationIntent::QuickReplyAck,
        EventKind::Attachments { attachments, .. } => {
            match attachments.iter().find_map(|a| a.button_payload()) {
                Some(payload) => intent_for_payload(payload, PayloadSource::Attachment),
                None => ConversationIntent::AttachmentAck,
            }
        }
        EventKind::Text { text, .. } => intent_for_text(text),
        EventKind::PostbackTap { payload, .. } => {
            intent_for_payload(payload, PayloadSource::Postback)
        }
        EventKind::Authentication { .. } => ConversationIntent::AuthenticationAck,
        EventKind::DeliveryReceipt { .. }
        | EventKind::ReadReceipt { .. }
        | EventKind::AccountLink { .. }
        | EventKind::Unsupported => ConversationIntent::Ignore,
    }
}

/// Classify free text: fixed lexicon first, then date, then symptom list, then echo.
pub fn intent_for_text(text: &str) -> ConversationIntent {
    match text {
        "read receipt" => ConversationIntent::ReadReceipt,
        "typing on" => ConversationIntent::TypingOn,
        "typing off" => ConversationIntent::TypingOff,
        "account linking" => ConversationIntent::AccountLinking,
        "age" => ConversationIntent::AgePrompt(AgeStyle::QuickReply),
        "Female" | "female" | "f" | "Other" | "other" | "NA" | "na" | "n/a" => {
            ConversationIntent::PregnancyPrompt
        }
        "Yes" | "No" | "yes" | "no" | "Y" | "N" | "y" | "n" => {
            ConversationIntent::DateOfBirthPrompt
        }
        "Get Started" | "get started" => ConversationIntent::GenderPrompt,
        _ => {
            if let Some(date) = parse_date(text) {
                ConversationIntent::DateOfBirthAnswer(date)
            } else if text.contains(',') {
                ConversationIntent::SymptomLookup(text.to_owned())
            } else {
                ConversationIntent::Echo(text.to_owned())
            }
        }
    }
}

/// Classify a postback or button-template payload.
pub fn intent_for_payload(raw: &str, source: PayloadSource) -> ConversationIntent {
    match Payload::classify(raw) {
        Payload::Tag(PayloadTag::Female | PayloadTag::Other) => {
            ConversationIntent::PregnancyPrompt
        }
        Payload::Tag(PayloadTag::Male | PayloadTag::Yes | PayloadTag::No) => {
            ConversationIntent::AgePrompt(AgeStyle::Buttons)
        }
        Payload::Tag(PayloadTag::Back) => ConversationIntent::GenderPrompt,
        Payload::Tag(PayloadTag::AgeLt18 | PayloadTag::Age18To50 | PayloadTag::AgeGt50) => {
            ConversationIntent::SymptomQueryPrompt
        }
        Payload::MoreInfo(detail) => ConversationIntent::MoreInfoDetail(detail),
        Payload::Unrecognised(other) => {
            tracing::debug!("payload not recognised: {:?}", other);
            ConversationIntent::UnrecognisedPayload(source)
        }
    }
}

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d-%B-%Y",
];

/// Parse a calendar date in one of the common written forms, or an RFC 3339 timestamp.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Turns inbound events into outbound replies.
#[derive(Clone)]
pub struct Dispatcher {
    server_url: String,
    lookup: DiagnosisLookupClient,
}

impl Dispatcher {
    /// `server_url` is the public base URL used for the account-linking target.
    pub fn new(server_url: impl Into<String>, lookup: DiagnosisLookupClient) -> Self {
        Self {
            server_url: server_url.into(),
            lookup,
        }
    }

    /// Decide the replies to `event`, in send order.
    pub async fn dispatch(&self, event: &InboundEvent) -> Vec<OutboundMessage> {
        log_event(event);
        let intent = intent_for(event);
        tracing::debug!("event from {} -> {:?}", event.sender_id, intent);
        self.respond(&event.sender_id, intent).await
    }

    /// Produce the replies for an already classified intent.
    pub async fn respond(
        &self,
        recipient_id: &str,
        intent: ConversationIntent,
    ) -> Vec<OutboundMessage> {
        let text = |t: &str| builder::text_with_metadata(recipient_id, t, DEFAULT_METADATA);

        match intent {
            ConversationIntent::GenderPrompt => vec![prompts::gender(recipient_id)],
            ConversationIntent::PregnancyPrompt => vec![prompts::pregnancy(recipient_id)],
            ConversationIntent::AgePrompt(AgeStyle::Buttons) => {
                vec![prompts::age_buttons(recipient_id)]
            }
            ConversationIntent::AgePrompt(AgeStyle::QuickReply) => {
                vec![prompts::age_quick_replies(recipient_id)]
            }
            ConversationIntent::SymptomQueryPrompt => vec![prompts::symptom_query(recipient_id)],
            ConversationIntent::DateOfBirthPrompt => vec![prompts::date_of_birth(recipient_id)],
            ConversationIntent::MoreInfoDetail(_) => vec![text(MORE_INFO_LEGEND)],
            ConversationIntent::DateOfBirthAnswer(date) => vec![
                text(&date.format("%Y-%m-%d").to_string()),
                prompts::symptom_query(recipient_id),
            ],
            ConversationIntent::SymptomLookup(query_text) => {
                self.diagnose(recipient_id, &query_text).await
            }
            ConversationIntent::Echo(echo) => vec![text(&echo)],
            ConversationIntent::ReadReceipt => {
                vec![builder::sender_action(recipient_id, SenderAction::MarkSeen)]
            }
            ConversationIntent::TypingOn => {
                vec![builder::sender_action(recipient_id, SenderAction::TypingOn)]
            }
            ConversationIntent::TypingOff => {
                vec![builder::sender_action(recipient_id, SenderAction::TypingOff)]
            }
            ConversationIntent::AccountLinking => {
                vec![prompts::account_linking(recipient_id, &self.server_url)]
            }
            ConversationIntent::QuickReplyAck => vec![text(QUICK_REPLY_ACK)],
            ConversationIntent::AttachmentAck => vec![text(ATTACHMENT_ACK)],
            ConversationIntent::UnrecognisedPayload(PayloadSource::Postback) => {
                vec![text(UNRECOGNISED_POSTBACK)]
            }
            ConversationIntent::UnrecognisedPayload(PayloadSource::Attachment) => {
                vec![text(UNRECOGNISED_ATTACHMENT_PAYLOAD)]
            }
            ConversationIntent::AuthenticationAck => vec![text(AUTHENTICATION_ACK)],
            ConversationIntent::Ignore => Vec::new(),
        }
    }

    /// Look up `query_text` and render the result, degrading to a text reply on failure.
    async fn diagnose(&self, recipient_id: &str, query_text: &str) -> Vec<OutboundMessage> {
        let text = |t: &str| builder::text_with_metadata(recipient_id, t, DEFAULT_METADATA);
        let config = self.lookup.config();

        let query = match DiagnosisQuery::from_text(query_text, config) {
            Ok(query) => query,
            Err(e) => {
                tracing::debug!("re-prompting {}: {}", recipient_id, e);
                return vec![prompts::symptom_query(recipient_id)];
            }
        };

        let raw = match self.lookup.lookup(&query).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("diagnosis lookup failed for {}: {}", recipient_id, e);
                return vec![text(LOOKUP_APOLOGY)];
            }
        };

        let conditions = match parse_diagnoses(&raw, &config.detail_search_url) {
            Ok(conditions) => conditions,
            Err(e) => {
                tracing::warn!("diagnosis response unreadable for {}: {}", recipient_id, e);
                return vec![text(LOOKUP_APOLOGY)];
            }
        };

        if conditions.is_empty() {
            return vec![text(NO_CONDITIONS_FOUND)];
        }

        tracing::info!(
            "rendering {} diagnoses for {}",
            conditions.len(),
            recipient_id
        );
        vec![render_diagnoses(recipient_id, &conditions)]
    }
}

fn log_event(event: &InboundEvent) {
    match &event.kind {
        EventKind::Authentication { pass_through } => tracing::info!(
            "authentication for user {} and page {} with pass-through {:?} at {}",
            event.sender_id,
            event.recipient_id,
            pass_through,
            event.timestamp
        ),
        EventKind::DeliveryReceipt {
            message_ids,
            watermark,
            ..
        } => tracing::debug!(
            "{} message(s) delivered to {} up to {}",
            message_ids.len(),
            event.sender_id,
            watermark
        ),
        EventKind::ReadReceipt { watermark, .. } => {
            tracing::debug!("{} read messages up to {}", event.sender_id, watermark)
        }
        EventKind::AccountLink { status, .. } => {
            tracing::info!("account link for {}: {}", event.sender_id, status)
        }
        EventKind::QuickReplyTap {
            message_id,
            payload,
        } => tracing::debug!("quick reply for {} with payload {}", message_id, payload),
        EventKind::Unsupported => {
            tracing::info!("unsupported messaging event from {}", event.sender_id)
        }
        _ => {}
    }
}
