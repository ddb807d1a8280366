use harvester_core::{
    DetailRecord, HarvestEntry, RelatedReference, SiteProfile, SummaryRecord, UNKNOWN_TAG,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn entry_serializes_related_as_suggested_questions() {
    let summary = SummaryRecord::new(
        "What is X?",
        Some("General".into()),
        Some("https://site/faq/x".into()),
    )
    .unwrap();
    let entry = HarvestEntry::merge(
        summary,
        Some(DetailRecord {
            answer: "X is ...".into(),
            related: vec![RelatedReference {
                question: "What is Z?".into(),
                href: "https://site/faq/z".into(),
            }],
        }),
    );

    let value = serde_json::to_value(&entry).unwrap();
    assert_eq!(
        value,
        json!({
            "tag": "General",
            "question": "What is X?",
            "href": "https://site/faq/x",
            "answer": "X is ...",
            "suggested_questions": [
                { "question": "What is Z?", "href": "https://site/faq/z" }
            ]
        })
    );
}

#[test]
fn entry_without_suggestions_still_parses() {
    let raw = r#"{"tag":"T","question":"Q","href":"","answer":""}"#;
    let entry: HarvestEntry = serde_json::from_str(raw).unwrap();
    assert!(entry.related.is_empty());
}

#[test]
fn summary_defaults_missing_tag() {
    let summary = SummaryRecord::new("How do I Y?", None, None).unwrap();
    assert_eq!(summary.tag(), UNKNOWN_TAG);
    assert_eq!(summary.detail_link(), None);
}

#[test]
fn profile_fills_missing_fields_from_defaults() {
    let raw = r#"{"origin":"https://faq.example"}"#;
    let profile: SiteProfile = serde_json::from_str(raw).unwrap();
    assert_eq!(profile.origin, "https://faq.example");
    assert_eq!(profile.listing_item, SiteProfile::default().listing_item);
}
