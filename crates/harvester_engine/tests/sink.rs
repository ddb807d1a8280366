use std::fs;

use harvester_core::{
    DetailRecord, FetchStatus, HarvestEntry, HarvestRun, HarvestRunBuilder, RelatedReference,
    SummaryRecord,
};
use harvester_engine::{
    ensure_output_dir, read_entries, JsonFileSink, PersistError, Sink, DEFAULT_OUTPUT_FILE,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn sample_run() -> HarvestRun {
    let linked = SummaryRecord::new(
        "How do I apply?",
        Some("Admissions".into()),
        Some("https://faq.example/faq/apply".into()),
    )
    .unwrap();
    let unlinked = SummaryRecord::new("Is there a hostel?", None, None).unwrap();

    let mut builder = HarvestRunBuilder::new(2, 0);
    builder.merge(
        0,
        HarvestEntry::merge(
            linked,
            Some(DetailRecord {
                answer: "Through the portal.".into(),
                related: vec![RelatedReference {
                    question: "What are the fees?".into(),
                    href: "https://faq.example/faq/fees".into(),
                }],
            }),
        ),
        FetchStatus::Clean,
    );
    builder.merge(1, HarvestEntry::merge(unlinked, None), FetchStatus::NotAttempted);
    builder.finish()
}

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn writes_pretty_json_array_with_wire_names() {
    let temp = TempDir::new().unwrap();
    let sink = JsonFileSink::new(temp.path(), DEFAULT_OUTPUT_FILE);
    sink.persist(&sample_run()).unwrap();

    let raw = fs::read_to_string(sink.path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let first = &value[0];
    assert_eq!(first["tag"], "Admissions");
    assert_eq!(first["question"], "How do I apply?");
    assert_eq!(first["href"], "https://faq.example/faq/apply");
    assert_eq!(first["answer"], "Through the portal.");
    assert_eq!(first["suggested_questions"][0]["question"], "What are the fees?");
    assert_eq!(first["suggested_questions"][0]["href"], "https://faq.example/faq/fees");

    let second = &value[1];
    assert_eq!(second["tag"], "Unknown");
    assert_eq!(second["href"], "");
    assert_eq!(second["answer"], "");
    assert!(raw.contains("\n  "), "output should be indented");
}

#[test]
fn persisted_entries_read_back() {
    let temp = TempDir::new().unwrap();
    let sink = JsonFileSink::new(temp.path(), "faq.json");
    let run = sample_run();
    sink.persist(&run).unwrap();

    assert_eq!(read_entries(&sink.path()).unwrap(), run.entries().to_vec());
}

#[test]
fn rewrite_replaces_previous_file() {
    let temp = TempDir::new().unwrap();
    let sink = JsonFileSink::new(temp.path(), "faq.json");
    sink.persist(&sample_run()).unwrap();
    sink.persist(&HarvestRunBuilder::new(0, 0).finish()).unwrap();

    assert!(read_entries(&sink.path()).unwrap().is_empty());
    let leftovers: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
    assert_eq!(leftovers.len(), 1, "temp files must not linger");
}

#[test]
fn file_in_place_of_directory_is_rejected() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "x").unwrap();

    let sink = JsonFileSink::new(blocker.clone(), "faq.json");
    let err = sink.persist(&sample_run()).unwrap_err();
    assert!(matches!(err, PersistError::OutputDir(_)));
}

#[test]
fn reading_garbage_is_an_encode_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.json");
    fs::write(&path, "[{").unwrap();

    assert!(matches!(read_entries(&path), Err(PersistError::Encode(_))));
}
