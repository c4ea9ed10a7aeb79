use std::path::PathBuf;

use crate::{
    foundation::error::{SdBatchError, SdBatchResult},
    job::spec::JobSpec,
};

/// How a batch-file value and a caller default combine for one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergePolicy {
    /// The batch value wins unless it is missing or empty; the override set is ignored.
    FillIfEmpty,
    /// The caller default replaces the batch value whenever the caller supplied it explicitly.
    OverrideIfFlagged,
}

/// The mergeable fields of a [`JobSpec`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobField {
    OutputPrefix,
    Prompt,
    NegativePrompt,
    InputImage,
    CfgScale,
    Width,
    Height,
    SampleMethod,
    SampleSteps,
    Strength,
    Seed,
}

impl JobField {
    pub const ALL: [JobField; 11] = [
        JobField::OutputPrefix,
        JobField::Prompt,
        JobField::NegativePrompt,
        JobField::InputImage,
        JobField::CfgScale,
        JobField::Width,
        JobField::Height,
        JobField::SampleMethod,
        JobField::SampleSteps,
        JobField::Strength,
        JobField::Seed,
    ];

    pub const fn policy(self) -> MergePolicy {
        match self {
            JobField::OutputPrefix | JobField::Prompt | JobField::NegativePrompt => {
                MergePolicy::FillIfEmpty
            }
            JobField::InputImage
            | JobField::CfgScale
            | JobField::Width
            | JobField::Height
            | JobField::SampleMethod
            | JobField::SampleSteps
            | JobField::Strength
            | JobField::Seed => MergePolicy::OverrideIfFlagged,
        }
    }

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Fields the caller supplied explicitly, as opposed to accepting a built-in default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverrideFieldSet(u16);

impl OverrideFieldSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, field: JobField) {
        self.0 |= field.bit();
    }

    pub fn with(mut self, field: JobField) -> Self {
        self.insert(field);
        self
    }

    pub fn contains(&self, field: JobField) -> bool {
        self.0 & field.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = JobField> {
        let set = *self;
        JobField::ALL.into_iter().filter(move |f| set.contains(*f))
    }
}

impl FromIterator<JobField> for OverrideFieldSet {
    fn from_iter<I: IntoIterator<Item = JobField>>(iter: I) -> Self {
        let mut set = Self::empty();
        for f in iter {
            set.insert(f);
        }
        set
    }
}

/// A partial job as written in a batch file. Omitted fields are filled at merge time.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BatchEntry {
    #[serde(default)]
    pub output_prefix: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, rename = "negPrompt")]
    pub negative_prompt: Option<String>,
    #[serde(default, rename = "inputImage")]
    pub input_image: Option<PathBuf>,
    #[serde(default)]
    pub cfg_scale: Option<f32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default, rename = "sampleMethod")]
    pub sample_method: Option<String>,
    #[serde(default)]
    pub sample_steps: Option<u32>,
    #[serde(default)]
    pub strength: Option<f32>,
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default)]
    pub repeats: Option<i64>,
}

/// Decode a batch file: a JSON array of partial job objects.
pub fn parse_batch(raw: &[u8]) -> SdBatchResult<Vec<BatchEntry>> {
    serde_json::from_slice(raw).map_err(|e| SdBatchError::config_decode(e.to_string()))
}

/// Combine caller defaults with an optional batch job list.
///
/// Without a batch the result is a single job equal to `defaults`. With a batch, every entry
/// becomes one job, in file order, with each field merged according to [`JobField::policy`].
pub fn merge_jobs(
    batch: Option<Vec<BatchEntry>>,
    defaults: &JobSpec,
    overrides: &OverrideFieldSet,
) -> Vec<JobSpec> {
    let mut jobs = match batch {
        None => vec![defaults.clone()],
        Some(entries) => entries
            .into_iter()
            .map(|entry| merge_entry(entry, defaults, overrides))
            .collect(),
    };
    for job in &mut jobs {
        job.repeats = job.repeats.max(1);
        job.normalize_input_image();
    }
    let flagged: Vec<JobField> = overrides.iter().collect();
    tracing::debug!(jobs = jobs.len(), overrides = ?flagged, "merged job list");
    jobs
}

/// [`parse_batch`] followed by [`merge_jobs`]. `None` means no batch file was given.
pub fn merge_batch_bytes(
    raw: Option<&[u8]>,
    defaults: &JobSpec,
    overrides: &OverrideFieldSet,
) -> SdBatchResult<Vec<JobSpec>> {
    let batch = raw.map(parse_batch).transpose()?;
    Ok(merge_jobs(batch, defaults, overrides))
}

fn merge_entry(entry: BatchEntry, defaults: &JobSpec, overrides: &OverrideFieldSet) -> JobSpec {
    let m = FieldMerger { overrides };
    JobSpec {
        output_prefix: m.text(
            JobField::OutputPrefix,
            entry.output_prefix,
            &defaults.output_prefix,
        ),
        prompt: m.text(JobField::Prompt, entry.prompt, &defaults.prompt),
        negative_prompt: m.text(
            JobField::NegativePrompt,
            entry.negative_prompt,
            &defaults.negative_prompt,
        ),
        input_image: m.value(
            JobField::InputImage,
            entry.input_image.map(Some),
            &defaults.input_image,
        ),
        cfg_scale: m.value(JobField::CfgScale, entry.cfg_scale, &defaults.cfg_scale),
        width: m.value(JobField::Width, entry.width, &defaults.width),
        height: m.value(JobField::Height, entry.height, &defaults.height),
        sample_method: m.text(
            JobField::SampleMethod,
            entry.sample_method,
            &defaults.sample_method,
        ),
        sample_steps: m.value(
            JobField::SampleSteps,
            entry.sample_steps,
            &defaults.sample_steps,
        ),
        strength: m.value(JobField::Strength, entry.strength, &defaults.strength),
        seed: m.value(JobField::Seed, entry.seed, &defaults.seed),
        repeats: match entry.repeats {
            Some(n) => u32::try_from(n.max(1)).unwrap_or(u32::MAX),
            None => defaults.repeats,
        },
    }
}

struct FieldMerger<'a> {
    overrides: &'a OverrideFieldSet,
}

impl FieldMerger<'_> {
    fn text(&self, field: JobField, entry: Option<String>, default: &str) -> String {
        self.merge(field, entry, default.to_string(), String::is_empty)
    }

    fn value<T: Clone>(&self, field: JobField, entry: Option<T>, default: &T) -> T {
        self.merge(field, entry, default.clone(), |_| false)
    }

    fn merge<T>(
        &self,
        field: JobField,
        entry: Option<T>,
        default: T,
        is_empty: impl Fn(&T) -> bool,
    ) -> T {
        match field.policy() {
            MergePolicy::FillIfEmpty => match entry {
                Some(v) if !is_empty(&v) => v,
                _ => default,
            },
            MergePolicy::OverrideIfFlagged if self.overrides.contains(field) => default,
            MergePolicy::OverrideIfFlagged => entry.unwrap_or(default),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/merge.rs"]
mod tests;
