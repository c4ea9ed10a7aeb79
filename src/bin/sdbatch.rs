use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{CommandFactory, FromArgMatches, Parser, ValueEnum, parser::ValueSource};
use sdbatch::{
    BatchOpts, EngineKind, EngineSettings, JobField, JobSpec, OverrideFieldSet, RepeatPlan,
    Schedule, job::spec,
};

#[derive(Parser, Debug)]
#[command(
    name = "sdbatch",
    version,
    about = "Run Stable Diffusion generation jobs from flags or a JSON job file"
)]
struct Cli {
    /// Model file for the engine.
    #[arg(short = 'm', long)]
    model: Option<PathBuf>,

    /// Engine thread count; -1 uses every available core.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    threads: i32,

    /// How many times to run the whole job list; negative repeats forever.
    #[arg(short = 'r', long, default_value_t = 1, allow_negative_numbers = true)]
    repeat: i64,

    /// Noise schedule: DEFAULT, DISCRETE, KARRAS.
    #[arg(long, default_value = "DEFAULT", value_parser = parse_schedule)]
    schedule: Schedule,

    /// Output directory for images and records (defaults to the system temp dir).
    #[arg(long = "output-dir", visible_alias = "od")]
    output_dir: Option<PathBuf>,

    /// Output file prefix; batch jobs keep their own unless empty.
    #[arg(short = 'o', long = "output-prefix", default_value = spec::DEFAULT_OUTPUT_PREFIX)]
    output_prefix: String,

    /// Prompt; batch jobs keep their own unless empty.
    #[arg(short = 'p', long)]
    prompt: Option<String>,

    /// Negative prompt; batch jobs keep their own unless empty.
    #[arg(long = "negative-prompt", visible_alias = "np")]
    negative_prompt: Option<String>,

    /// Start image; selects image-to-image mode. Overrides batch jobs when given.
    #[arg(short = 'i', long = "init-image")]
    init_image: Option<PathBuf>,

    /// JSON job file (array of partial jobs).
    #[arg(short = 'j', long = "jobs")]
    jobs: Option<PathBuf>,

    /// Classifier-free guidance scale. Overrides batch jobs when given.
    #[arg(long = "cfg-scale", default_value_t = spec::DEFAULT_CFG_SCALE)]
    cfg_scale: f32,

    /// Image width; the preferred value depends on the model. Overrides batch jobs when given.
    #[arg(short = 'W', long, default_value_t = spec::DEFAULT_SIZE)]
    width: u32,

    /// Image height; the preferred value depends on the model. Overrides batch jobs when given.
    #[arg(short = 'H', long, default_value_t = spec::DEFAULT_SIZE)]
    height: u32,

    /// Sample method: EULER_A, EULER, HEUN, DPM2, DPMPP2S_A, DPMPP2M, DPMPP2Mv2.
    #[arg(long = "sample-method", visible_alias = "sm", default_value = spec::DEFAULT_SAMPLE_METHOD)]
    sample_method: String,

    /// Number of sampling steps. Overrides batch jobs when given.
    #[arg(short = 'n', long, default_value_t = spec::DEFAULT_SAMPLE_STEPS)]
    steps: u32,

    /// img2img noising strength, 1 = full destruction of the start image.
    #[arg(long, default_value_t = spec::DEFAULT_STRENGTH)]
    strength: f32,

    /// RNG seed; negative draws a fresh seed per generation.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    seed: i64,

    /// Engine to use.
    #[arg(long, value_enum, default_value_t = EngineChoice::Sd)]
    engine: EngineChoice,

    /// stable-diffusion.cpp executable used by the `sd` engine.
    #[arg(long = "sd-bin", default_value = "sd")]
    sd_bin: PathBuf,

    /// More log output (-v debug, -vv trace).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EngineChoice {
    Sd,
    Preview,
}

/// Command-line argument ids that set a job field.
const FIELD_FLAGS: [(&str, JobField); 11] = [
    ("output_prefix", JobField::OutputPrefix),
    ("prompt", JobField::Prompt),
    ("negative_prompt", JobField::NegativePrompt),
    ("init_image", JobField::InputImage),
    ("cfg_scale", JobField::CfgScale),
    ("width", JobField::Width),
    ("height", JobField::Height),
    ("sample_method", JobField::SampleMethod),
    ("steps", JobField::SampleSteps),
    ("strength", JobField::Strength),
    ("seed", JobField::Seed),
];

fn main() -> anyhow::Result<()> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    init_tracing(cli.verbose);

    let overrides: OverrideFieldSet = FIELD_FLAGS
        .into_iter()
        .filter(|(id, _)| matches.value_source(id) == Some(ValueSource::CommandLine))
        .map(|(_, field)| field)
        .collect();

    run(cli, overrides)
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli, overrides: OverrideFieldSet) -> anyhow::Result<()> {
    let defaults = JobSpec {
        output_prefix: cli.output_prefix,
        prompt: cli.prompt.unwrap_or_default(),
        negative_prompt: cli.negative_prompt.unwrap_or_default(),
        input_image: cli.init_image,
        cfg_scale: cli.cfg_scale,
        width: cli.width,
        height: cli.height,
        sample_method: cli.sample_method,
        sample_steps: cli.steps,
        strength: cli.strength,
        seed: cli.seed,
        repeats: 1,
    };

    let raw = cli.jobs.as_deref().map(read_job_file).transpose()?;
    let jobs = sdbatch::merge_batch_bytes(raw.as_deref(), &defaults, &overrides)
        .with_context(|| match &cli.jobs {
            Some(p) => format!("parse job file '{}'", p.display()),
            None => "build job from flags".to_string(),
        })?;
    tracing::info!(jobs = jobs.len(), "job list ready");

    sdbatch::validate_jobs(&jobs)?;

    let kind = match cli.engine {
        EngineChoice::Sd => EngineKind::Sd,
        EngineChoice::Preview => EngineKind::Preview,
    };
    let settings = EngineSettings {
        model: cli.model.unwrap_or_default(),
        threads: cli.threads,
        schedule: cli.schedule,
        program: cli.sd_bin,
    };
    let mut engine = sdbatch::create_engine(kind, &settings)
        .with_context(|| "error initializing stable diffusion")?;

    let opts = BatchOpts {
        output_dir: cli.output_dir.unwrap_or_else(std::env::temp_dir),
        repeat: RepeatPlan::from_count(cli.repeat),
    };
    let stats = sdbatch::run_batch(&jobs, &opts, engine.as_mut(), &mut rand::thread_rng())?;

    eprintln!(
        "generated {} image(s) into {} ({} ms in engine)",
        stats.generations,
        opts.output_dir.display(),
        stats.engine_ms
    );
    Ok(())
}

fn read_job_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("error reading job file '{}'", path.display()))
}

fn parse_schedule(s: &str) -> Result<Schedule, String> {
    s.parse().map_err(|e: sdbatch::SdBatchError| e.to_string())
}
