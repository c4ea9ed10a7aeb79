use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    engine::{
        backend::{EngineSettings, GenerationEngine},
        pixels::RgbBuffer,
    },
    foundation::error::{SdBatchError, SdBatchResult},
    params::{GenerationParameters, Schedule},
};

const STDERR_TAIL_LINES: usize = 20;

/// Engine backed by the stable-diffusion.cpp `sd` executable.
///
/// Every call spawns the program once and reads the produced PNG back as packed RGB. Start
/// images and results pass through a scratch directory that lives as long as the engine.
pub struct ProcessEngine {
    settings: EngineSettings,
    threads: usize,
    scratch: tempfile::TempDir,
}

impl ProcessEngine {
    pub fn new(settings: EngineSettings) -> SdBatchResult<Self> {
        if settings.model.as_os_str().is_empty() {
            return Err(SdBatchError::engine("no model file given"));
        }
        let exists = settings.model.try_exists().map_err(|e| {
            SdBatchError::io(format!("check model '{}'", settings.model.display()), e)
        })?;
        if !exists {
            return Err(SdBatchError::engine(format!(
                "model file {} not found",
                settings.model.display()
            )));
        }

        let scratch = tempfile::Builder::new()
            .prefix("sdbatch-")
            .tempdir()
            .map_err(|e| SdBatchError::io("create engine scratch directory", e))?;
        let threads = settings.resolved_threads();

        tracing::info!(
            model = %settings.model.display(),
            program = %settings.program.display(),
            threads,
            schedule = %settings.schedule,
            "engine ready"
        );

        Ok(Self {
            settings,
            threads,
            scratch,
        })
    }

    fn run(
        &mut self,
        params: &GenerationParameters,
        init: Option<(&Path, f32)>,
    ) -> SdBatchResult<RgbBuffer> {
        let out = self.scratch.path().join("result.png");
        let args = engine_args(&self.settings, self.threads, params, init, &out);

        tracing::debug!(program = %self.settings.program.display(), ?args, "spawning engine");
        let output = Command::new(&self.settings.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                SdBatchError::engine(format!(
                    "failed to spawn '{}' (is it installed and on PATH?): {e}",
                    self.settings.program.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SdBatchError::engine(format!(
                "engine exited with status {}: {}",
                output.status,
                stderr_tail(&stderr)
            )));
        }

        let img = image::open(&out)
            .map_err(|e| SdBatchError::engine(format!("engine produced no readable image: {e}")))?
            .to_rgb8();
        std::fs::remove_file(&out)
            .map_err(|e| SdBatchError::io(format!("remove '{}'", out.display()), e))?;

        if (img.width(), img.height()) != (params.width(), params.height()) {
            return Err(SdBatchError::engine(format!(
                "engine returned {}x{}, expected {}x{}",
                img.width(),
                img.height(),
                params.width(),
                params.height()
            )));
        }
        RgbBuffer::new(img.width(), img.height(), img.into_raw())
    }
}

impl GenerationEngine for ProcessEngine {
    fn txt2img(&mut self, params: &GenerationParameters) -> SdBatchResult<RgbBuffer> {
        self.run(params, None)
    }

    fn img2img(
        &mut self,
        start: &RgbBuffer,
        params: &GenerationParameters,
    ) -> SdBatchResult<RgbBuffer> {
        let init = self.scratch.path().join("init.png");
        image::save_buffer_with_format(
            &init,
            start.as_bytes(),
            start.width(),
            start.height(),
            image::ColorType::Rgb8,
            image::ImageFormat::Png,
        )?;
        let result = self.run(params, Some((init.as_path(), params.strength())));
        remove_scratch_file(&init);
        result
    }
}

fn engine_args(
    settings: &EngineSettings,
    threads: usize,
    params: &GenerationParameters,
    init: Option<(&Path, f32)>,
    out: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    let mut push = |flag: &str, value: OsString| {
        args.push(flag.into());
        args.push(value);
    };

    let mode = if init.is_some() { "img2img" } else { "txt2img" };
    push("--mode", mode.into());
    push("--model", settings.model.clone().into_os_string());
    push("--threads", threads.to_string().into());
    if settings.schedule != Schedule::Default {
        push("--schedule", settings.schedule.cli_name().into());
    }
    push("--prompt", params.prompt().into());
    if !params.negative_prompt().is_empty() {
        push("--negative-prompt", params.negative_prompt().into());
    }
    push("--cfg-scale", params.cfg_scale().to_string().into());
    push("--width", params.width().to_string().into());
    push("--height", params.height().to_string().into());
    push("--sampling-method", params.sample_method().cli_name().into());
    push("--steps", params.sample_steps().to_string().into());
    push("--seed", params.seed().to_string().into());
    if let Some((path, strength)) = init {
        push("--init-img", path.as_os_str().to_owned());
        push("--strength", strength.to_string().into());
    }
    push("--output", PathBuf::from(out).into_os_string());
    args
}

/// Best-effort cleanup; the scratch directory is removed with the engine anyway.
fn remove_scratch_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::debug!(path = %path.display(), error = %e, "scratch file not removed");
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
#[path = "../../tests/unit/engine/process.rs"]
mod tests;
