//! Symptom checker response parsing.
//!
//! The provider answers with an XML document:
//!
//! ```xml
//! <Diagnosis_checklist>
//!   <diagnosis>
//!     <diagnoses_name>Migraine</diagnoses_name>
//!     <common_diagnoses>true</common_diagnoses>
//!     <red_flag>false</red_flag>
//!     <weightage>3</weightage>
//!   </diagnosis>
//!   ...
//! </Diagnosis_checklist>
//! ```
//!
//! There is no count field: the list ends at the first missing entry. At most
//! [`MAX_CONDITIONS`] entries are read. Unknown elements are ignored.
//!
//! Per-record policy: an entry missing its name or relevance, or with a flag that is neither
//! `true` nor `false`, is skipped with a warning and the remaining entries are kept in order.

use crate::constants::MAX_CONDITIONS;
use crate::lookup::encode_uri_component;
use crate::ParseError;
use serde::Deserialize;

/// A normalised diagnosis returned by the symptom checker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionRecord {
    pub name: String,
    /// Search link for the diagnosis on the patient information site.
    pub detail_url: String,
    pub is_common: bool,
    pub is_urgent: bool,
    /// Provider relevance score, kept verbatim.
    pub relevance: String,
}

/// Parse a raw diagnosis document into condition records.
///
/// `detail_search_url` is the search host used to build each record's `detail_url`.
///
/// # Errors
///
/// Returns [`ParseError::Malformed`] if the document is not well-formed XML or does not have
/// the checklist shape. The error carries the path of the failing element.
pub fn parse_diagnoses(
    raw: &str,
    detail_search_url: &str,
) -> Result<Vec<ConditionRecord>, ParseError> {
    let mut deserializer = quick_xml::de::Deserializer::from_str(raw);
    let wire: WireChecklist =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
            let path = err.path().to_string();
            let path = if path == "." { "<root>".to_string() } else { path };
            ParseError::Malformed {
                path,
                reason: err.into_inner().to_string(),
            }
        })?;

    let mut records = Vec::with_capacity(wire.diagnosis.len().min(MAX_CONDITIONS));
    for (idx, entry) in wire.diagnosis.into_iter().take(MAX_CONDITIONS).enumerate() {
        match wire_to_domain(entry, detail_search_url) {
            Ok(record) => records.push(record),
            Err(reason) => tracing::warn!("skipping diagnosis[{}]: {}", idx, reason),
        }
    }

    Ok(records)
}

/// Search link for `name`: `<host>?searchterm=<encoded name>&searchcoll=All`.
pub fn detail_url(detail_search_url: &str, name: &str) -> String {
    format!(
        "{detail_search_url}?searchterm={}&searchcoll=All",
        encode_uri_component(name)
    )
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
struct WireChecklist {
    #[serde(default)]
    diagnosis: Vec<WireDiagnosis>,
}

#[derive(Debug, Deserialize)]
struct WireDiagnosis {
    diagnoses_name: Option<String>,
    common_diagnoses: Option<String>,
    red_flag: Option<String>,
    weightage: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(
    entry: WireDiagnosis,
    detail_search_url: &str,
) -> Result<ConditionRecord, String> {
    let name = entry
        .diagnoses_name
        .map(|n| n.trim().to_owned())
        .filter(|n| !n.is_empty())
        .ok_or("missing diagnoses_name")?;
    let relevance = entry
        .weightage
        .map(|w| w.trim().to_owned())
        .filter(|w| !w.is_empty())
        .ok_or("missing weightage")?;

    Ok(ConditionRecord {
        detail_url: detail_url(detail_search_url, &name),
        is_common: flag("common_diagnoses", entry.common_diagnoses)?,
        is_urgent: flag("red_flag", entry.red_flag)?,
        name,
        relevance,
    })
}

/// Coerce a provider flag. Absent or empty means `false`.
fn flag(field: &str, value: Option<String>) -> Result<bool, String> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" | "" => Ok(false),
        other => Err(format!("{field} is not a boolean: {other:?}")),
    }
}
