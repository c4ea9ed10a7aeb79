use pretty_assertions::assert_eq;

use super::*;
use crate::job::merge::{OverrideFieldSet, merge_batch_bytes};

fn record(dir: &Path) -> CompletionRecord {
    CompletionRecord {
        filename: dir.join("x_7.png"),
        run_duration_ms: 1234,
        job: JobSpec {
            output_prefix: "x".to_string(),
            prompt: "cat".to_string(),
            width: 64,
            height: 64,
            sample_steps: 5,
            seed: 7,
            ..JobSpec::default()
        },
    }
}

#[test]
fn record_path_swaps_extension_only() {
    assert_eq!(
        record_path_for(Path::new("/tmp/a.png.dir/x_7_1.png")),
        PathBuf::from("/tmp/a.png.dir/x_7_1.json")
    );
}

#[test]
fn written_record_uses_wire_names() {
    let dir = tempfile::tempdir().unwrap();
    let rec = record(dir.path());
    let path = write_record(&rec).unwrap();
    assert_eq!(path, dir.path().join("x_7.json"));

    let value: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(value["runDuration"], 1234);
    assert_eq!(value["job"]["seed"], 7);
    assert_eq!(value["job"]["outputPrefix"], "x");
    assert_eq!(value["job"]["negPrompt"], "");
    assert!(value["job"].get("inputImage").is_none());
    assert!(value["filename"].as_str().unwrap().ends_with("x_7.png"));

    let back: CompletionRecord = serde_json::from_value(value).unwrap();
    assert_eq!(back, rec);
}

#[test]
fn recorded_job_replays_as_batch_entry() {
    let dir = tempfile::tempdir().unwrap();
    let rec = record(dir.path());
    let batch = format!("[{}]", serde_json::to_string(&rec.job).unwrap());

    let jobs = merge_batch_bytes(
        Some(batch.as_bytes()),
        &JobSpec::default(),
        &OverrideFieldSet::empty(),
    )
    .unwrap();
    assert_eq!(jobs, vec![rec.job]);
}
