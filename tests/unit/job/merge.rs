use pretty_assertions::assert_eq;

use super::*;

fn defaults() -> JobSpec {
    JobSpec {
        output_prefix: "def".to_string(),
        prompt: "default prompt".to_string(),
        negative_prompt: "default neg".to_string(),
        input_image: None,
        cfg_scale: 7.0,
        width: 512,
        height: 512,
        sample_method: "EULER".to_string(),
        sample_steps: 10,
        strength: 0.75,
        seed: -1,
        repeats: 1,
    }
}

#[test]
fn policy_table_splits_fields_into_two_classes() {
    let fill: Vec<_> = JobField::ALL
        .into_iter()
        .filter(|f| f.policy() == MergePolicy::FillIfEmpty)
        .collect();
    assert_eq!(
        fill,
        vec![
            JobField::OutputPrefix,
            JobField::Prompt,
            JobField::NegativePrompt
        ]
    );
    assert_eq!(
        JobField::ALL
            .into_iter()
            .filter(|f| f.policy() == MergePolicy::OverrideIfFlagged)
            .count(),
        8
    );
}

#[test]
fn override_set_tracks_membership() {
    let set: OverrideFieldSet = [JobField::Width, JobField::Seed].into_iter().collect();
    assert!(set.contains(JobField::Width));
    assert!(set.contains(JobField::Seed));
    assert!(!set.contains(JobField::Height));
    assert_eq!(
        set.iter().collect::<Vec<_>>(),
        vec![JobField::Width, JobField::Seed]
    );
    assert!(OverrideFieldSet::empty().is_empty());
}

#[test]
fn no_batch_yields_single_default_job() {
    let jobs = merge_jobs(None, &defaults(), &OverrideFieldSet::empty());
    assert_eq!(jobs, vec![defaults()]);
}

#[test]
fn non_empty_prompt_wins_even_when_flagged() {
    let overrides = OverrideFieldSet::empty()
        .with(JobField::Prompt)
        .with(JobField::NegativePrompt)
        .with(JobField::OutputPrefix);
    let entries = vec![BatchEntry {
        prompt: Some("a red fox".to_string()),
        negative_prompt: Some("blurry".to_string()),
        output_prefix: Some("fox".to_string()),
        ..Default::default()
    }];
    let jobs = merge_jobs(Some(entries), &defaults(), &overrides);
    assert_eq!(jobs[0].prompt, "a red fox");
    assert_eq!(jobs[0].negative_prompt, "blurry");
    assert_eq!(jobs[0].output_prefix, "fox");
}

#[test]
fn empty_or_missing_text_is_filled_from_defaults() {
    let entries = vec![
        BatchEntry {
            prompt: Some(String::new()),
            ..Default::default()
        },
        BatchEntry::default(),
    ];
    let jobs = merge_jobs(Some(entries), &defaults(), &OverrideFieldSet::empty());
    for job in &jobs {
        assert_eq!(job.prompt, "default prompt");
        assert_eq!(job.negative_prompt, "default neg");
        assert_eq!(job.output_prefix, "def");
    }
}

#[test]
fn flagged_width_replaces_batch_width() {
    let overrides = OverrideFieldSet::empty().with(JobField::Width);
    let entries = vec![BatchEntry {
        width: Some(768),
        height: Some(768),
        ..Default::default()
    }];
    let jobs = merge_jobs(Some(entries), &defaults(), &overrides);
    assert_eq!(jobs[0].width, 512);
    assert_eq!(jobs[0].height, 768);
}

#[test]
fn unflagged_values_are_kept_as_written() {
    let entries = vec![BatchEntry {
        cfg_scale: Some(4.5),
        sample_method: Some("HEUN".to_string()),
        sample_steps: Some(30),
        strength: Some(0.3),
        seed: Some(42),
        input_image: Some(PathBuf::from("start.png")),
        ..Default::default()
    }];
    let jobs = merge_jobs(Some(entries), &defaults(), &OverrideFieldSet::empty());
    let job = &jobs[0];
    assert_eq!(job.cfg_scale, 4.5);
    assert_eq!(job.sample_method, "HEUN");
    assert_eq!(job.sample_steps, 30);
    assert_eq!(job.strength, 0.3);
    assert_eq!(job.seed, 42);
    assert_eq!(job.input_image, Some(PathBuf::from("start.png")));
}

#[test]
fn flagged_input_image_replaces_batch_image_even_with_none() {
    let overrides = OverrideFieldSet::empty().with(JobField::InputImage);
    let entries = vec![BatchEntry {
        input_image: Some(PathBuf::from("start.png")),
        prompt: Some("x".to_string()),
        ..Default::default()
    }];
    let jobs = merge_jobs(Some(entries), &defaults(), &overrides);
    assert_eq!(jobs[0].input_image, None);
}

#[test]
fn empty_input_image_means_text_to_image() {
    let entries = vec![BatchEntry {
        input_image: Some(PathBuf::new()),
        ..Default::default()
    }];
    let jobs = merge_jobs(Some(entries), &defaults(), &OverrideFieldSet::empty());
    assert!(!jobs[0].is_img2img());
}

#[test]
fn repeats_are_normalized_to_at_least_one() {
    let entries = vec![
        BatchEntry {
            repeats: Some(0),
            ..Default::default()
        },
        BatchEntry {
            repeats: Some(-4),
            ..Default::default()
        },
        BatchEntry {
            repeats: Some(3),
            ..Default::default()
        },
    ];
    let jobs = merge_jobs(Some(entries), &defaults(), &OverrideFieldSet::empty());
    let repeats: Vec<u32> = jobs.iter().map(|j| j.repeats).collect();
    assert_eq!(repeats, vec![1, 1, 3]);

    let mut zero = defaults();
    zero.repeats = 0;
    let jobs = merge_jobs(None, &zero, &OverrideFieldSet::empty());
    assert_eq!(jobs[0].repeats, 1);
}

#[test]
fn batch_order_is_preserved() {
    let raw = br#"[
        {"prompt": "first", "seed": 1},
        {"prompt": "second", "seed": 2},
        {"prompt": "third", "seed": 3}
    ]"#;
    let jobs =
        merge_batch_bytes(Some(raw), &defaults(), &OverrideFieldSet::empty()).unwrap();
    let prompts: Vec<&str> = jobs.iter().map(|j| j.prompt.as_str()).collect();
    assert_eq!(prompts, vec!["first", "second", "third"]);
}

#[test]
fn wire_names_match_batch_format() {
    let raw = br#"[{
        "outputPrefix": "o", "inputImage": "in.png", "prompt": "p", "negPrompt": "n",
        "cfgScale": 5.0, "width": 256, "height": 128, "sampleMethod": "DPM2",
        "sampleSteps": 4, "strength": 0.5, "seed": 9, "repeats": 2
    }]"#;
    let entries = parse_batch(raw).unwrap();
    assert_eq!(entries[0].negative_prompt.as_deref(), Some("n"));
    assert_eq!(entries[0].input_image, Some(PathBuf::from("in.png")));
    assert_eq!(entries[0].sample_method.as_deref(), Some("DPM2"));
    assert_eq!(entries[0].repeats, Some(2));
}

#[test]
fn malformed_payload_is_a_decode_error() {
    for raw in [
        &b"not json"[..],
        &b"{\"prompt\": \"x\"}"[..],
        &b"[{\"width\": -5}]"[..],
        &b"[{\"promt\": \"typo\"}]"[..],
    ] {
        let err = merge_batch_bytes(Some(raw), &defaults(), &OverrideFieldSet::empty())
            .unwrap_err();
        assert!(matches!(err, SdBatchError::ConfigDecode(_)), "{err}");
    }
}
