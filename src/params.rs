use std::{fmt, str::FromStr};

use rand::Rng;

use crate::{
    foundation::error::{SdBatchError, SdBatchResult},
    job::spec::JobSpec,
};

/// Sampling algorithm selector understood by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleMethod {
    EulerA,
    Euler,
    Heun,
    Dpm2,
    Dpmpp2sA,
    Dpmpp2m,
    Dpmpp2mV2,
}

impl SampleMethod {
    /// Canonical names, in engine enum order.
    pub const TABLE: [(&'static str, SampleMethod); 7] = [
        ("EULER_A", SampleMethod::EulerA),
        ("EULER", SampleMethod::Euler),
        ("HEUN", SampleMethod::Heun),
        ("DPM2", SampleMethod::Dpm2),
        ("DPMPP2S_A", SampleMethod::Dpmpp2sA),
        ("DPMPP2M", SampleMethod::Dpmpp2m),
        ("DPMPP2Mv2", SampleMethod::Dpmpp2mV2),
    ];

    pub fn name(self) -> &'static str {
        table_name(&Self::TABLE, self)
    }

    /// Spelling used by the stable-diffusion.cpp command line.
    pub fn cli_name(self) -> &'static str {
        match self {
            SampleMethod::EulerA => "euler_a",
            SampleMethod::Euler => "euler",
            SampleMethod::Heun => "heun",
            SampleMethod::Dpm2 => "dpm2",
            SampleMethod::Dpmpp2sA => "dpm++2s_a",
            SampleMethod::Dpmpp2m => "dpm++2m",
            SampleMethod::Dpmpp2mV2 => "dpm++2mv2",
        }
    }
}

impl FromStr for SampleMethod {
    type Err = SdBatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        table_lookup(&Self::TABLE, s).ok_or_else(|| {
            SdBatchError::parameter_resolution(unknown_name("sample method", s, &Self::TABLE))
        })
    }
}

impl fmt::Display for SampleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Noise schedule selector, fixed for the lifetime of a loaded engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Schedule {
    #[default]
    Default,
    Discrete,
    Karras,
}

impl Schedule {
    pub const TABLE: [(&'static str, Schedule); 3] = [
        ("DEFAULT", Schedule::Default),
        ("DISCRETE", Schedule::Discrete),
        ("KARRAS", Schedule::Karras),
    ];

    pub fn name(self) -> &'static str {
        table_name(&Self::TABLE, self)
    }

    pub fn cli_name(self) -> &'static str {
        match self {
            Schedule::Default => "default",
            Schedule::Discrete => "discrete",
            Schedule::Karras => "karras",
        }
    }
}

impl FromStr for Schedule {
    type Err = SdBatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        table_lookup(&Self::TABLE, s).ok_or_else(|| {
            SdBatchError::parameter_resolution(unknown_name("schedule", s, &Self::TABLE))
        })
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn table_lookup<T: Copy>(table: &[(&'static str, T)], s: &str) -> Option<T> {
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(s.trim()))
        .map(|(_, v)| *v)
}

fn table_name<T: Copy + PartialEq>(table: &[(&'static str, T)], v: T) -> &'static str {
    table
        .iter()
        .find(|(_, t)| *t == v)
        .map(|(name, _)| *name)
        .unwrap_or("?")
}

fn unknown_name<T>(what: &str, s: &str, table: &[(&'static str, T)]) -> String {
    let valid: Vec<&str> = table.iter().map(|(name, _)| *name).collect();
    format!("invalid {what} name '{s}' (valid: {})", valid.join(", "))
}

/// Fully resolved inputs of one engine call. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationParameters {
    prompt: String,
    negative_prompt: String,
    cfg_scale: f32,
    width: u32,
    height: u32,
    sample_method: SampleMethod,
    sample_steps: u32,
    strength: f32,
    seed: u64,
}

impl GenerationParameters {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn negative_prompt(&self) -> &str {
        &self.negative_prompt
    }

    pub fn cfg_scale(&self) -> f32 {
        self.cfg_scale
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn sample_method(&self) -> SampleMethod {
        self.sample_method
    }

    pub fn sample_steps(&self) -> u32 {
        self.sample_steps
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Concrete seed; never exceeds `i64::MAX`.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Packed RGB byte length the engine must return for these dimensions.
    pub fn rgb_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// Parameters for one generation plus the job as it will actually be executed.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub params: GenerationParameters,
    /// Copy of the source job with the concrete seed written back.
    pub executed: JobSpec,
}

/// Turn a validated job into engine parameters.
///
/// A negative seed draws a fresh non-negative 63-bit seed from `rng`; any other seed is kept.
pub fn resolve_job<R: Rng + ?Sized>(job: &JobSpec, rng: &mut R) -> SdBatchResult<Resolution> {
    let sample_method: SampleMethod = job.sample_method.parse()?;

    let seed = if job.seed < 0 {
        rng.gen_range(0..=i64::MAX)
    } else {
        job.seed
    };

    let params = GenerationParameters {
        prompt: job.prompt.clone(),
        negative_prompt: job.negative_prompt.clone(),
        cfg_scale: job.cfg_scale,
        width: job.width,
        height: job.height,
        sample_method,
        sample_steps: job.sample_steps,
        strength: job.strength,
        seed: seed.unsigned_abs(),
    };

    let mut executed = job.clone();
    executed.seed = seed;

    Ok(Resolution { params, executed })
}

#[cfg(test)]
#[path = "../tests/unit/params.rs"]
mod tests;
