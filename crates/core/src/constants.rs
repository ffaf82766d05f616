//! Constants used throughout the symbot core crate.
//!
//! User-facing copy, developer metadata tags and provider defaults live here so the
//! conversation flow and its tests agree on exact strings.

/// Maximum number of diagnoses read from a lookup response and rendered as cards.
pub const MAX_CONDITIONS: usize = 10;

/// Prefix of the "About these results" postback payload.
pub const MORE_INFO_PAYLOAD_PREFIX: &str = "MORE_INFO_";

/// Subtitle tag for diagnoses flagged as common in the user's region.
pub const COMMON_TAG: &str = "[Common]";

/// Subtitle tag for red-flag diagnoses.
pub const URGENT_TAG: &str = "[Urgent]";

/// Metadata attached to most text replies.
pub const DEFAULT_METADATA: &str = "DEVELOPER_DEFINED_METADATA";

/// Metadata attached to the symptom-query prompt.
pub const QUERY_METADATA: &str = "QUERY_METADATA";

pub const GENDER_PROMPT: &str = "What is your gender?";
pub const PREGNANCY_PROMPT: &str = "Are you pregnant?";
pub const AGE_BUTTONS_PROMPT: &str = "Age of patient";
pub const AGE_QUICK_REPLY_PROMPT: &str = "Age of patient (years)";
pub const DATE_OF_BIRTH_PROMPT: &str = "What is your date of birth?";
pub const SYMPTOM_QUERY_PROMPT: &str =
    "Please enter your symptoms, separated by a comma: e.g. 'headache, back pain, temperature'";
pub const ACCOUNT_LINK_PROMPT: &str = "Welcome. Link your account.";

pub const QUICK_REPLY_ACK: &str = "Quick reply tapped";
pub const ATTACHMENT_ACK: &str = "Message with attachment received";
pub const UNRECOGNISED_ATTACHMENT_PAYLOAD: &str = "Message with payload received";
pub const UNRECOGNISED_POSTBACK: &str = "Postback called";
pub const AUTHENTICATION_ACK: &str = "Authentication successful";

/// Sent when the symptom checker cannot be reached or its answer cannot be read.
pub const LOOKUP_APOLOGY: &str =
    "Sorry, there seems to be a connection issue currently, please try again later.";

/// Sent when the symptom checker answered but listed no diagnoses.
pub const NO_CONDITIONS_FOUND: &str = "No matching conditions were found for those symptoms.";

/// Explanation of the subtitle tags, sent for any `MORE_INFO_` postback.
pub const MORE_INFO_LEGEND: &str = "[Urgent]\r\n\
Seek medical advice immediately if you're concerned this may apply to you, as emergency medical attention is required.\r\n\r\n\
[Common]\r\nThis diagnosis is common in your region.\r\n\r\n\
Relevance\r\nThe degree of match between the query entered and the diagnosis database.";

/// Title of the postback button on each diagnosis card.
pub const MORE_INFO_BUTTON_TITLE: &str = "About these results";

/// Title of the web link button on each diagnosis card.
pub const DETAIL_BUTTON_TITLE: &str = "View on Patient.info";

/// Path on `SERVER_URL` that serves the account-linking page.
pub const AUTHORIZE_PATH: &str = "/authorize";

pub const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com/v2.6";
pub const DEFAULT_SYMPTOM_CHECKER_URL: &str =
    "http://symptomchecker.isabelhealthcare.com/private/emr_diagnosis.jsp";
pub const DEFAULT_DIAGNOSIS_SEARCH_URL: &str = "http://patient.info/search.asp";
pub const DEFAULT_REGION_ID: u32 = 1;
pub const DEFAULT_SYSTEM_ID: u32 = 2138;
pub const DEFAULT_SPECIALTIES: u32 = 28;
pub const DEFAULT_DATE_OF_BIRTH: &str = "7";
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 5;
