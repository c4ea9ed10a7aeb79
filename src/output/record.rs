use std::path::{Path, PathBuf};

use crate::{
    foundation::error::{SdBatchError, SdBatchResult},
    job::spec::JobSpec,
};

pub const RECORD_EXTENSION: &str = "json";

/// Metadata for one successful generation, written next to the image.
///
/// The `job` object uses the batch-file field names, so it can be pasted into a batch file to
/// replay the generation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompletionRecord {
    /// Path of the written image.
    pub filename: PathBuf,
    /// Engine call duration in milliseconds.
    #[serde(rename = "runDuration")]
    pub run_duration_ms: u64,
    /// The job as executed, with its concrete seed.
    pub job: JobSpec,
}

/// Sibling metadata path: same base name, `.json` extension.
pub fn record_path_for(image: &Path) -> PathBuf {
    image.with_extension(RECORD_EXTENSION)
}

/// Serialize `record` beside its image and return the record path.
pub fn write_record(record: &CompletionRecord) -> SdBatchResult<PathBuf> {
    let path = record_path_for(&record.filename);
    let bytes = serde_json::to_vec_pretty(record)
        .map_err(|e| SdBatchError::Other(anyhow::Error::new(e).context("encode completion record")))?;
    std::fs::write(&path, bytes)
        .map_err(|e| SdBatchError::io(format!("write record '{}'", path.display()), e))?;
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/unit/output/record.rs"]
mod tests;
