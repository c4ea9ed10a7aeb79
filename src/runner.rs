use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use image::RgbaImage;
use rand::RngCore;

use crate::{
    engine::{
        backend::GenerationEngine,
        pixels::{RgbBuffer, decode_rgb, encode_rgb},
    },
    foundation::error::{SdBatchError, SdBatchResult},
    job::spec::JobSpec,
    output::{
        naming::next_output_path,
        record::{CompletionRecord, write_record},
    },
    params::resolve_job,
};

/// How many times the whole job list runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepeatPlan {
    Times(u64),
    /// Run until a generation fails or the process is killed.
    Forever,
}

impl RepeatPlan {
    /// Command-line convention: negative counts repeat forever.
    pub fn from_count(count: i64) -> Self {
        match u64::try_from(count) {
            Ok(n) => RepeatPlan::Times(n),
            Err(_) => RepeatPlan::Forever,
        }
    }

    fn allows(self, r: u64) -> bool {
        match self {
            RepeatPlan::Times(n) => r < n,
            RepeatPlan::Forever => true,
        }
    }
}

impl Default for RepeatPlan {
    fn default() -> Self {
        RepeatPlan::Times(1)
    }
}

/// Options for [`run_batch`].
#[derive(Clone, Debug)]
pub struct BatchOpts {
    /// Directory receiving images and records. Created if missing.
    pub output_dir: PathBuf,
    pub repeat: RepeatPlan,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub generations: u64,
    /// Sum of engine call durations.
    pub engine_ms: u64,
}

/// Drive the engine over the work matrix: repeat group, then job, then per-job repeat.
///
/// `jobs` must already have passed [`crate::validate_jobs`]. The first failure aborts the run;
/// the error carries the failing loop position.
#[tracing::instrument(skip_all, fields(jobs = jobs.len(), out = %opts.output_dir.display()))]
pub fn run_batch(
    jobs: &[JobSpec],
    opts: &BatchOpts,
    engine: &mut dyn GenerationEngine,
    rng: &mut dyn RngCore,
) -> SdBatchResult<RunStats> {
    ensure_dir(&opts.output_dir)?;

    let mut stats = RunStats::default();
    if jobs.iter().all(|job| job.repeats == 0) {
        tracing::warn!("job list has no generations; nothing to run");
        return Ok(stats);
    }
    let mut r: u64 = 0;
    while opts.repeat.allows(r) {
        for (j, job) in jobs.iter().enumerate() {
            for k in 0..job.repeats {
                let record = generate_one(job, &opts.output_dir, engine, rng)
                    .map_err(|e| e.in_job(r, j, k))?;
                tracing::info!(
                    job = j,
                    repeat = r,
                    iteration = k,
                    seed = record.job.seed,
                    ms = record.run_duration_ms,
                    "generated {}",
                    record.filename.display()
                );
                stats.generations = stats.generations.saturating_add(1);
                stats.engine_ms = stats.engine_ms.saturating_add(record.run_duration_ms);
            }
        }
        r += 1;
    }

    Ok(stats)
}

fn generate_one(
    job: &JobSpec,
    output_dir: &Path,
    engine: &mut dyn GenerationEngine,
    rng: &mut dyn RngCore,
) -> SdBatchResult<CompletionRecord> {
    let resolved = resolve_job(job, rng)?;
    let params = &resolved.params;

    let (raw, elapsed) = match &job.input_image {
        None => {
            let t0 = Instant::now();
            let raw = engine.txt2img(params)?;
            (raw, t0.elapsed())
        }
        Some(path) => {
            if params.strength() <= 0.0 {
                // Non-fatal: the engine still receives the given strength.
                tracing::warn!(strength = params.strength(), "img2img strength is not positive");
            }
            let start = load_start_image(path)?;
            if (start.width(), start.height()) != (params.width(), params.height()) {
                return Err(SdBatchError::engine(format!(
                    "start image dimensions {}x{} do not match image dimensions {}x{}",
                    start.width(),
                    start.height(),
                    params.width(),
                    params.height()
                )));
            }
            let t0 = Instant::now();
            let raw = engine.img2img(&start, params)?;
            (raw, t0.elapsed())
        }
    };

    if raw.as_bytes().len() != params.rgb_len()
        || (raw.width(), raw.height()) != (params.width(), params.height())
    {
        return Err(SdBatchError::engine(format!(
            "engine returned {}x{} ({} bytes), expected {}x{}",
            raw.width(),
            raw.height(),
            raw.as_bytes().len(),
            params.width(),
            params.height()
        )));
    }
    let img = decode_rgb(raw)?;

    let path = next_output_path(output_dir, &job.output_prefix, params.seed())?;
    save_png(&img, &path)?;

    let record = CompletionRecord {
        filename: path,
        run_duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        job: resolved.executed,
    };
    write_record(&record)?;
    Ok(record)
}

fn load_start_image(path: &Path) -> SdBatchResult<RgbBuffer> {
    let img = image::open(path)
        .map_err(|e| SdBatchError::image(format!("error loading {}: {e}", path.display())))?;
    Ok(encode_rgb(&img.to_rgba8()))
}

fn save_png(img: &RgbaImage, path: &Path) -> SdBatchResult<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| SdBatchError::image(format!("error writing {}: {e}", path.display())))
}

fn ensure_dir(dir: &Path) -> SdBatchResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        SdBatchError::io(
            format!("failed to create output directory '{}'", dir.display()),
            e,
        )
    })
}

#[cfg(test)]
#[path = "../tests/unit/runner.rs"]
mod tests;
