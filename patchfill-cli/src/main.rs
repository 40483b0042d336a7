use clap::Parser;
use patchfill::image::io::{load_mask, load_rgb_image, save_image};
use patchfill::{
    compute_correspondence, CorrespondenceField, ExemplarInpainter, InpaintConfig, Norm,
    PatchMatchConfig, Prior,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Patchfill CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Mode {
    #[default]
    Inpaint,
    Correspondence,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum NormConfig {
    L1,
    L2,
    L2Sqr,
}

impl From<NormConfig> for Norm {
    fn from(value: NormConfig) -> Self {
        match value {
            NormConfig::L1 => Norm::L1,
            NormConfig::L2 => Norm::L2,
            NormConfig::L2Sqr => Norm::L2Sqr,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct InpaintConfigJson {
    patch_size: usize,
    partition: (usize, usize),
    max_weak_errors: usize,
    max_mean_difference: f32,
    use_candidate_filter: bool,
    parallel: bool,
}

impl Default for InpaintConfigJson {
    fn default() -> Self {
        let cfg = InpaintConfig::default();
        Self {
            patch_size: cfg.patch_size,
            partition: cfg.partition,
            max_weak_errors: cfg.max_weak_errors,
            max_mean_difference: cfg.max_mean_difference,
            use_candidate_filter: cfg.use_candidate_filter,
            parallel: cfg.parallel,
        }
    }
}

impl From<InpaintConfigJson> for InpaintConfig {
    fn from(value: InpaintConfigJson) -> Self {
        Self {
            patch_size: value.patch_size,
            partition: value.partition,
            max_weak_errors: value.max_weak_errors,
            max_mean_difference: value.max_mean_difference,
            use_candidate_filter: value.use_candidate_filter,
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CorrespondenceConfigJson {
    half_patch_size: usize,
    iterations: usize,
    norm: NormConfig,
    alpha: f64,
    seed: u64,
    parallel: bool,
}

impl Default for CorrespondenceConfigJson {
    fn default() -> Self {
        let cfg = PatchMatchConfig::default();
        Self {
            half_patch_size: cfg.half_patch_size,
            iterations: cfg.iterations,
            norm: NormConfig::L2Sqr,
            alpha: cfg.alpha,
            seed: cfg.seed,
            parallel: cfg.parallel,
        }
    }
}

impl From<CorrespondenceConfigJson> for PatchMatchConfig {
    fn from(value: CorrespondenceConfigJson) -> Self {
        Self {
            half_patch_size: value.half_patch_size,
            iterations: value.iterations,
            norm: value.norm.into(),
            alpha: value.alpha,
            seed: value.seed,
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    mode: Mode,
    image_path: String,
    target_mask_path: Option<String>,
    source_mask_path: Option<String>,
    target_path: Option<String>,
    target_valid_mask_path: Option<String>,
    output_path: Option<String>,
    field_path: Option<String>,
    inpaint: InpaintConfigJson,
    correspondence: CorrespondenceConfigJson,
}

#[derive(Debug, Serialize)]
struct InpaintSummary {
    steps: usize,
    filled: usize,
    fallback_steps: usize,
}

#[derive(Debug, Serialize)]
struct FieldRecord {
    width: usize,
    height: usize,
    /// Row-major `[x, y]` target centers.
    targets: Vec<[i32; 2]>,
    distances: Vec<f64>,
    mean_distance: Option<f64>,
}

impl From<&CorrespondenceField> for FieldRecord {
    fn from(field: &CorrespondenceField) -> Self {
        Self {
            width: field.width(),
            height: field.height(),
            targets: field.targets().iter().map(|p| [p.x, p.y]).collect(),
            distances: field.distances().to_vec(),
            mean_distance: field.mean_distance(),
        }
    }
}

fn run_inpaint(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let target_path = config
        .target_mask_path
        .as_deref()
        .ok_or("target_mask_path must be set for inpaint mode")?;

    let mut inpainter = ExemplarInpainter::with_config(config.inpaint.into());
    inpainter.set_source_image(load_rgb_image(&config.image_path)?);
    inpainter.set_target_mask(load_mask(target_path)?);
    if let Some(path) = &config.source_mask_path {
        inpainter.set_source_mask(load_mask(path)?);
    }
    inpainter.initialize()?;

    let mut summary = InpaintSummary {
        steps: 0,
        filled: 0,
        fallback_steps: 0,
    };
    while inpainter.has_more_steps() {
        let report = inpainter.step()?;
        summary.steps += 1;
        summary.filled += report.filled;
        summary.fallback_steps += usize::from(report.used_fallback);
    }

    if let (Some(path), Some(image)) = (&config.output_path, inpainter.image()) {
        save_image(image, path)?;
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_correspondence(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let target_path = config
        .target_path
        .as_deref()
        .ok_or("target_path must be set for correspondence mode")?;

    let source = load_rgb_image(&config.image_path)?;
    let target = load_rgb_image(target_path)?;
    let valid = config
        .target_valid_mask_path
        .as_deref()
        .map(load_mask)
        .transpose()?;

    let field = compute_correspondence(
        &source,
        &target,
        valid.as_ref(),
        Prior::None,
        &config.correspondence.into(),
    )?;

    if let Some(path) = &config.output_path {
        save_image(&field.reconstruct(&target)?, path)?;
    }
    let record = FieldRecord::from(&field);
    match &config.field_path {
        Some(path) => fs::write(path, serde_json::to_string(&record)?)?,
        None => println!(
            "{}",
            serde_json::json!({
                "width": record.width,
                "height": record.height,
                "mean_distance": record.mean_distance,
            })
        ),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("patchfill=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() {
        return Err("image_path must be set in the config".into());
    }

    match config.mode {
        Mode::Inpaint => run_inpaint(config),
        Mode::Correspondence => run_correspondence(config),
    }
}
