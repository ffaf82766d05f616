//! Structured reply rendering for diagnosis results.

use crate::constants::{
    COMMON_TAG, DETAIL_BUTTON_TITLE, MAX_CONDITIONS, MORE_INFO_BUTTON_TITLE,
    MORE_INFO_PAYLOAD_PREFIX, URGENT_TAG,
};
use crate::parser::ConditionRecord;
use messenger::{builder, GenericElement, OutboundMessage};

/// Card subtitle: `"[Common] "` if common, then `"[Urgent] "` if urgent, then the relevance.
///
/// The "About these results" payload embeds this exact string, so the order is fixed.
pub fn subtitle(condition: &ConditionRecord) -> String {
    let mut text = String::new();
    if condition.is_common {
        text.push_str(COMMON_TAG);
        text.push(' ');
    }
    if condition.is_urgent {
        text.push_str(URGENT_TAG);
        text.push(' ');
    }
    text.push_str("Relevance: ");
    text.push_str(&condition.relevance);
    text
}

/// Render conditions as a generic template, one card per condition in order.
///
/// At most [`MAX_CONDITIONS`] cards are produced. An empty slice yields a template with no
/// elements.
pub fn render_diagnoses(recipient_id: &str, conditions: &[ConditionRecord]) -> OutboundMessage {
    let elements = conditions
        .iter()
        .take(MAX_CONDITIONS)
        .map(|condition| {
            let subtitle = subtitle(condition);
            GenericElement {
                title: condition.name.clone(),
                buttons: vec![
                    builder::postback(
                        MORE_INFO_BUTTON_TITLE,
                        format!("{MORE_INFO_PAYLOAD_PREFIX}{subtitle}"),
                    ),
                    builder::web_url(DETAIL_BUTTON_TITLE, condition.detail_url.clone()),
                ],
                subtitle: Some(subtitle),
            }
        })
        .collect();

    builder::generic(recipient_id, elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_diagnoses;
    use messenger::{Button, OutboundBody};

    fn condition(name: &str, common: bool, urgent: bool, relevance: &str) -> ConditionRecord {
        ConditionRecord {
            name: name.into(),
            detail_url: format!("http://patient.info/search.asp?searchterm={name}&searchcoll=All"),
            is_common: common,
            is_urgent: urgent,
            relevance: relevance.into(),
        }
    }

    fn elements(msg: OutboundMessage) -> Vec<GenericElement> {
        match msg.body {
            OutboundBody::GenericTemplate { elements } => elements,
            other => panic!("expected generic template, got {other:?}"),
        }
    }

    #[test]
    fn empty_conditions_render_empty_template() {
        let msg = render_diagnoses("U", &[]);
        assert_eq!(msg.recipient_id, "U");
        assert!(elements(msg).is_empty());
    }

    #[test]
    fn common_tag_precedes_urgent_tag() {
        assert_eq!(
            subtitle(&condition("X", true, true, "7")),
            "[Common] [Urgent] Relevance: 7"
        );
        assert_eq!(subtitle(&condition("X", false, false, "1")), "Relevance: 1");
    }

    #[test]
    fn cards_carry_more_info_and_detail_buttons() {
        let els = elements(render_diagnoses("U", &[condition("Flu", true, false, "3")]));
        assert_eq!(els.len(), 1);
        assert_eq!(els[0].title, "Flu");
        assert_eq!(els[0].subtitle.as_deref(), Some("[Common] Relevance: 3"));
        assert_eq!(
            els[0].buttons,
            vec![
                Button::Postback {
                    title: "About these results".into(),
                    payload: "MORE_INFO_[Common] Relevance: 3".into(),
                },
                Button::WebUrl {
                    title: "View on Patient.info".into(),
                    url: "http://patient.info/search.asp?searchterm=Flu&searchcoll=All".into(),
                },
            ]
        );
    }

    #[test]
    fn caps_cards_at_ten() {
        let many: Vec<ConditionRecord> = (0..12)
            .map(|i| condition(&format!("C{i}"), false, false, "1"))
            .collect();
        assert_eq!(elements(render_diagnoses("U", &many)).len(), MAX_CONDITIONS);
    }

    #[test]
    fn renders_parsed_response() {
        let raw = "<Diagnosis_checklist>\
            <diagnosis><diagnoses_name>Migraine</diagnoses_name><common_diagnoses>true</common_diagnoses>\
            <red_flag>false</red_flag><weightage>3</weightage></diagnosis>\
            <diagnosis><diagnoses_name>Subarachnoid haemorrhage</diagnoses_name><common_diagnoses>false</common_diagnoses>\
            <red_flag>true</red_flag><weightage>5</weightage></diagnosis>\
            </Diagnosis_checklist>";

        let conditions = parse_diagnoses(raw, "http://patient.info/search.asp").expect("parse");
        let subtitles: Vec<Option<String>> = elements(render_diagnoses("U", &conditions))
            .into_iter()
            .map(|e| e.subtitle)
            .collect();

        assert_eq!(
            subtitles,
            vec![
                Some("[Common] Relevance: 3".to_string()),
                Some("[Urgent] Relevance: 5".to_string()),
            ]
        );
    }
}
