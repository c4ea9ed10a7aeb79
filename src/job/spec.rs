use std::path::PathBuf;

/// Output prefix used when neither the command line nor the batch file names one.
pub const DEFAULT_OUTPUT_PREFIX: &str = "outsd";
pub const DEFAULT_CFG_SCALE: f32 = 7.0;
pub const DEFAULT_SIZE: u32 = 512;
pub const DEFAULT_SAMPLE_METHOD: &str = "EULER";
pub const DEFAULT_SAMPLE_STEPS: u32 = 10;
pub const DEFAULT_STRENGTH: f32 = 0.75;

/// One unit of requested generation work.
///
/// The same type carries the caller defaults (built from command-line flags) and each merged
/// batch job. Field names on the wire match the batch file format, so a serialized job can be
/// fed back as a batch entry.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    /// File name prefix for generated images.
    pub output_prefix: String,
    /// Positive prompt.
    pub prompt: String,
    /// Negative prompt.
    #[serde(rename = "negPrompt")]
    pub negative_prompt: String,
    /// Start image; presence selects image-to-image mode.
    #[serde(
        rename = "inputImage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub input_image: Option<PathBuf>,
    /// Classifier-free guidance scale.
    pub cfg_scale: f32,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Sampler name, resolved to [`crate::SampleMethod`] at validation time.
    #[serde(rename = "sampleMethod")]
    pub sample_method: String,
    /// Number of sampling steps.
    pub sample_steps: u32,
    /// Noising strength, only meaningful in image-to-image mode.
    pub strength: f32,
    /// RNG seed; negative means "draw a fresh seed per generation".
    pub seed: i64,
    /// How many times this job runs inside one repeat group. Always >= 1 after merging.
    pub repeats: u32,
}

impl Default for JobSpec {
    fn default() -> Self {
        Self {
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            prompt: String::new(),
            negative_prompt: String::new(),
            input_image: None,
            cfg_scale: DEFAULT_CFG_SCALE,
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            sample_method: DEFAULT_SAMPLE_METHOD.to_string(),
            sample_steps: DEFAULT_SAMPLE_STEPS,
            strength: DEFAULT_STRENGTH,
            seed: -1,
            repeats: 1,
        }
    }
}

impl JobSpec {
    pub fn is_img2img(&self) -> bool {
        self.input_image.is_some()
    }

    /// Treat an empty start image path the same as "no start image".
    pub(crate) fn normalize_input_image(&mut self) {
        if self
            .input_image
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            self.input_image = None;
        }
    }
}
