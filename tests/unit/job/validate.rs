use std::path::PathBuf;

use super::*;

fn valid() -> JobSpec {
    JobSpec {
        prompt: "cat".to_string(),
        ..JobSpec::default()
    }
}

#[test]
fn default_job_with_prompt_is_valid() {
    assert!(validate_job(&valid()).is_ok());
}

#[test]
fn job_without_any_input_is_rejected() {
    let job = JobSpec {
        prompt: String::new(),
        negative_prompt: String::new(),
        input_image: None,
        ..valid()
    };
    let problems = validate_job(&job).unwrap_err();
    assert_eq!(problems.len(), 1);
    assert!(problems[0].contains("prompt"));
}

#[test]
fn negative_prompt_or_input_image_alone_is_enough() {
    let neg_only = JobSpec {
        prompt: String::new(),
        negative_prompt: "ugly".to_string(),
        ..valid()
    };
    assert!(validate_job(&neg_only).is_ok());

    let image_only = JobSpec {
        prompt: String::new(),
        input_image: Some(PathBuf::from("start.png")),
        ..valid()
    };
    assert!(validate_job(&image_only).is_ok());
}

#[test]
fn every_problem_of_a_job_is_reported() {
    let job = JobSpec {
        output_prefix: String::new(),
        sample_method: "WRONG".to_string(),
        width: 0,
        sample_steps: 0,
        ..valid()
    };
    let problems = validate_job(&job).unwrap_err();
    assert_eq!(problems.len(), 4, "{problems:?}");
    assert!(problems.iter().any(|p| p.contains("output prefix")));
    assert!(problems.iter().any(|p| p.contains("EULER_A")));
}

#[test]
fn one_invalid_job_rejects_the_batch() {
    let bad = JobSpec {
        output_prefix: String::new(),
        ..valid()
    };
    let err = validate_jobs(&[valid(), bad, valid()]).unwrap_err();
    let SdBatchError::Validation(issues) = err else {
        panic!("expected validation error");
    };
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].job, 1);
}

#[test]
fn all_failing_jobs_are_collected() {
    let bad = JobSpec {
        prompt: String::new(),
        ..valid()
    };
    let err = validate_jobs(&[bad.clone(), valid(), bad]).unwrap_err();
    let SdBatchError::Validation(issues) = err else {
        panic!("expected validation error");
    };
    let indices: Vec<usize> = issues.iter().map(|i| i.job).collect();
    assert_eq!(indices, vec![0, 2]);
}
