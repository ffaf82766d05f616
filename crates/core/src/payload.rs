//! Postback payload tags.
//!
//! The conversation keeps no server-side state: the step a user is on is carried entirely by
//! the payload of the button they tapped. Tags are matched by exact equality, except the
//! `MORE_INFO_` family which is matched by prefix.

use crate::constants::MORE_INFO_PAYLOAD_PREFIX;

/// The closed set of developer-defined payloads the conversation flow emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadTag {
    Female,
    Male,
    Other,
    Yes,
    No,
    Back,
    AgeLt18,
    Age18To50,
    AgeGt50,
}

impl PayloadTag {
    /// Every tag, in prompt order.
    pub const ALL: [PayloadTag; 9] = [
        Self::Female,
        Self::Male,
        Self::Other,
        Self::Yes,
        Self::No,
        Self::Back,
        Self::AgeLt18,
        Self::Age18To50,
        Self::AgeGt50,
    ];

    /// Returns the wire payload string for this tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Female => "FEMALE_PAYLOAD",
            Self::Male => "MALE_PAYLOAD",
            Self::Other => "OTHER_PAYLOAD",
            Self::Yes => "YES_PAYLOAD",
            Self::No => "NO_PAYLOAD",
            Self::Back => "BACK_PAYLOAD",
            Self::AgeLt18 => "AGE_LT_18_PAYLOAD",
            Self::Age18To50 => "AGE_18_50_PAYLOAD",
            Self::AgeGt50 => "AGE_GT_50_PAYLOAD",
        }
    }

    /// Parses an exact wire payload string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == s)
    }
}

/// A classified postback payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// One of the fixed flow tags.
    Tag(PayloadTag),
    /// `MORE_INFO_<detail>`; the detail is kept but does not affect the reply.
    MoreInfo(String),
    /// Anything else.
    Unrecognised(String),
}

impl Payload {
    /// Classifies a raw payload string. Total: every input maps to a variant.
    pub fn classify(raw: &str) -> Self {
        if let Some(tag) = PayloadTag::parse(raw) {
            return Self::Tag(tag);
        }
        match raw.strip_prefix(MORE_INFO_PAYLOAD_PREFIX) {
            Some(detail) => Self::MoreInfo(detail.to_owned()),
            None => Self::Unrecognised(raw.to_owned()),
        }
    }
}
