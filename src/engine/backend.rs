use std::path::PathBuf;

use crate::{
    engine::pixels::RgbBuffer,
    foundation::error::SdBatchResult,
    params::{GenerationParameters, Schedule},
};

/// A loaded generation engine.
///
/// Engines are stateful and non-reentrant: the runner holds one `&mut` for the whole run and
/// never overlaps calls. Both calls return a packed RGB buffer of exactly
/// `params.width() * params.height() * 3` bytes, or an error.
pub trait GenerationEngine {
    fn txt2img(&mut self, params: &GenerationParameters) -> SdBatchResult<RgbBuffer>;

    /// `start` has already been checked against `params.width()` x `params.height()`.
    fn img2img(
        &mut self,
        start: &RgbBuffer,
        params: &GenerationParameters,
    ) -> SdBatchResult<RgbBuffer>;
}

/// Available engine implementations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EngineKind {
    /// The stable-diffusion.cpp `sd` executable.
    #[default]
    Sd,
    /// Built-in synthetic images; no model required.
    Preview,
}

/// Settings fixed when the engine is loaded.
#[derive(Clone, Debug)]
pub struct EngineSettings {
    /// Model weights file.
    pub model: PathBuf,
    /// Engine-internal thread count; values below 1 mean "all available cores".
    pub threads: i32,
    pub schedule: Schedule,
    /// Engine executable for [`EngineKind::Sd`].
    pub program: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            model: PathBuf::new(),
            threads: -1,
            schedule: Schedule::Default,
            program: PathBuf::from("sd"),
        }
    }
}

impl EngineSettings {
    pub fn resolved_threads(&self) -> usize {
        match usize::try_from(self.threads) {
            Ok(n) if n >= 1 => n,
            _ => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// Load an engine implementation.
pub fn create_engine(
    kind: EngineKind,
    settings: &EngineSettings,
) -> SdBatchResult<Box<dyn GenerationEngine>> {
    match kind {
        EngineKind::Sd => Ok(Box::new(crate::engine::process::ProcessEngine::new(
            settings.clone(),
        )?)),
        EngineKind::Preview => Ok(Box::new(crate::engine::preview::PreviewEngine::new())),
    }
}
