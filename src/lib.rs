//! sdbatch drives a Stable Diffusion engine through a declarative list of generation jobs.
//!
//! # Pipeline overview
//!
//! 1. **Merge**: caller defaults + optional JSON batch file -> ordered [`JobSpec`] list
//! 2. **Validate**: every job is checked before any engine work (all-or-nothing)
//! 3. **Run**: repeat group x job x per-job repeat, one engine call each, strictly sequential
//! 4. **Write**: `{prefix}_{seed}[_{n}].png` plus a sibling `.json` [`CompletionRecord`]
//!
//! The engine is anything implementing [`GenerationEngine`]: packed RGB out for
//! [`GenerationParameters`] in.
#![forbid(unsafe_code)]

pub mod engine;
pub mod foundation;
pub mod job;
pub mod output;
pub mod params;
pub mod runner;

pub use engine::backend::{EngineKind, EngineSettings, GenerationEngine, create_engine};
pub use engine::pixels::{RgbBuffer, decode_rgb, encode_rgb};
pub use engine::preview::PreviewEngine;
pub use engine::process::ProcessEngine;
pub use foundation::error::{JobIssue, SdBatchError, SdBatchResult};
pub use job::merge::{
    BatchEntry, JobField, MergePolicy, OverrideFieldSet, merge_batch_bytes, merge_jobs,
    parse_batch,
};
pub use job::spec::JobSpec;
pub use job::validate::{validate_job, validate_jobs};
pub use output::naming::next_output_path;
pub use output::record::{CompletionRecord, record_path_for, write_record};
pub use params::{GenerationParameters, Resolution, SampleMethod, Schedule, resolve_job};
pub use runner::{BatchOpts, RepeatPlan, RunStats, run_batch};
