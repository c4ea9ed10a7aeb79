use crate::{
    foundation::error::{JobIssue, SdBatchError, SdBatchResult},
    job::spec::JobSpec,
    params::SampleMethod,
};

/// Collect every structural problem of a single job.
pub fn validate_job(job: &JobSpec) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();

    if job.output_prefix.is_empty() {
        problems.push("output prefix required".to_string());
    }
    if let Err(e) = job.sample_method.parse::<SampleMethod>() {
        problems.push(e.to_string());
    }
    if job.prompt.is_empty() && job.negative_prompt.is_empty() && !job.is_img2img() {
        problems.push("prompt, negative prompt or input image required".to_string());
    }
    if job.width == 0 || job.height == 0 {
        problems.push(format!(
            "image dimensions must be non-zero (got {}x{})",
            job.width, job.height
        ));
    }
    if job.sample_steps == 0 {
        problems.push("sample steps must be non-zero".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

/// Check the whole batch before any engine work. One bad job rejects all of them.
pub fn validate_jobs(jobs: &[JobSpec]) -> SdBatchResult<()> {
    let issues: Vec<JobIssue> = jobs
        .iter()
        .enumerate()
        .filter_map(|(i, job)| {
            validate_job(job)
                .err()
                .map(|problems| JobIssue { job: i, problems })
        })
        .collect();

    if issues.is_empty() {
        return Ok(());
    }
    for issue in &issues {
        tracing::error!(job = issue.job, "{issue}");
    }
    Err(SdBatchError::Validation(issues))
}

#[cfg(test)]
#[path = "../../tests/unit/job/validate.rs"]
mod tests;
