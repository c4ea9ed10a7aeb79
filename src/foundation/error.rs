use std::fmt;

pub type SdBatchResult<T> = Result<T, SdBatchError>;

/// Every failure is fatal to a run; there is no retry or partial-success path.
#[derive(thiserror::Error, Debug)]
pub enum SdBatchError {
    #[error("config decode error: {0}")]
    ConfigDecode(String),

    #[error("validation error: {}", format_issues(.0))]
    Validation(Vec<JobIssue>),

    #[error("parameter resolution error: {0}")]
    ParameterResolution(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("io error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("job{job} (repeat {repeat}, iteration {iteration}) failed: {source}")]
    Job {
        repeat: u64,
        job: usize,
        iteration: u32,
        #[source]
        source: Box<SdBatchError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SdBatchError {
    pub fn config_decode(msg: impl Into<String>) -> Self {
        Self::ConfigDecode(msg.into())
    }

    pub fn parameter_resolution(msg: impl Into<String>) -> Self {
        Self::ParameterResolution(msg.into())
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Attach the loop position of the failing generation.
    pub fn in_job(self, repeat: u64, job: usize, iteration: u32) -> Self {
        Self::Job {
            repeat,
            job,
            iteration,
            source: Box::new(self),
        }
    }
}

impl From<image::ImageError> for SdBatchError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e.to_string())
    }
}

/// All validation failures of one job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobIssue {
    pub job: usize,
    pub problems: Vec<String>,
}

impl fmt::Display for JobIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid job{}: {}", self.job, self.problems.join("; "))
    }
}

fn format_issues(issues: &[JobIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
