//! The fixed prompts of the conversation flow.
//!
//! Each function builds the complete outbound message for one step; the dispatcher decides
//! which step applies.

use crate::constants::{
    ACCOUNT_LINK_PROMPT, AGE_BUTTONS_PROMPT, AGE_QUICK_REPLY_PROMPT, AUTHORIZE_PATH,
    DATE_OF_BIRTH_PROMPT, DEFAULT_METADATA, GENDER_PROMPT, PREGNANCY_PROMPT, QUERY_METADATA,
    SYMPTOM_QUERY_PROMPT,
};
use crate::payload::PayloadTag;
use messenger::builder;
use messenger::OutboundMessage;

/// Quick-reply age bands. These payloads are acknowledged but never branch the flow.
pub const AGE_QUICK_REPLIES: [(&str, &str); 5] = [
    ("0-6", "AGE_1_PAYLOAD"),
    ("7-18", "AGE_2_PAYLOAD"),
    ("19-40", "AGE_3_PAYLOAD"),
    ("41-60", "AGE_4_PAYLOAD"),
    ("61+", "AGE_5_PAYLOAD"),
];

pub fn gender(recipient_id: &str) -> OutboundMessage {
    builder::postback_buttons(
        recipient_id,
        GENDER_PROMPT,
        &[
            ("Female", PayloadTag::Female.as_str()),
            ("Male", PayloadTag::Male.as_str()),
            ("Other", PayloadTag::Other.as_str()),
        ],
    )
}

pub fn pregnancy(recipient_id: &str) -> OutboundMessage {
    builder::postback_buttons(
        recipient_id,
        PREGNANCY_PROMPT,
        &[
            ("Yes", PayloadTag::Yes.as_str()),
            ("No", PayloadTag::No.as_str()),
            ("Back", PayloadTag::Back.as_str()),
        ],
    )
}

pub fn age_buttons(recipient_id: &str) -> OutboundMessage {
    builder::postback_buttons(
        recipient_id,
        AGE_BUTTONS_PROMPT,
        &[
            ("< 18 years old", PayloadTag::AgeLt18.as_str()),
            ("18 - 50 years old", PayloadTag::Age18To50.as_str()),
            ("> 50 years old", PayloadTag::AgeGt50.as_str()),
        ],
    )
}

pub fn age_quick_replies(recipient_id: &str) -> OutboundMessage {
    builder::quick_replies(
        recipient_id,
        AGE_QUICK_REPLY_PROMPT,
        Some(DEFAULT_METADATA.to_owned()),
        &AGE_QUICK_REPLIES,
    )
}

pub fn date_of_birth(recipient_id: &str) -> OutboundMessage {
    builder::text_with_metadata(recipient_id, DATE_OF_BIRTH_PROMPT, DEFAULT_METADATA)
}

pub fn symptom_query(recipient_id: &str) -> OutboundMessage {
    builder::text_with_metadata(recipient_id, SYMPTOM_QUERY_PROMPT, QUERY_METADATA)
}

/// Account-linking call to action targeting `<server_url>/authorize`.
pub fn account_linking(recipient_id: &str, server_url: &str) -> OutboundMessage {
    builder::account_link(
        recipient_id,
        ACCOUNT_LINK_PROMPT,
        format!("{server_url}{AUTHORIZE_PATH}"),
    )
}
