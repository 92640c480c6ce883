use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use voice_morph_core::codec::domain::encoder_settings::OpusApplication;
use voice_morph_core::effects::domain::morph_preset::MorphPreset;
use voice_morph_core::pipeline::morph_settings::MorphSettings;
use voice_morph_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use voice_morph_core::pipeline::transcode_job::TranscodeJob;

/// libopus accepts bitrates in this range.
const MIN_BITRATE: u32 = 500;
const MAX_BITRATE: u32 = 512_000;
const MAX_COMPLEXITY: u8 = 10;

/// Apply a voice morph preset to an OGG/Opus recording.
#[derive(Parser, Debug)]
#[command(name = "voice-morph", version)]
struct Cli {
    /// Input OGG/Opus file.
    #[arg(required_unless_present = "list_presets")]
    input: Option<PathBuf>,

    /// Output OGG/Opus file.
    #[arg(required_unless_present = "list_presets")]
    output: Option<PathBuf>,

    /// Preset: disabled, anonymous, female, male, child or robot.
    #[arg(long, default_value = "anonymous")]
    preset: String,

    /// Encoder bitrate in bits per second (overrides the config file).
    #[arg(long)]
    bitrate: Option<u32>,

    /// Encoder application: voip, audio or lowdelay (overrides the config file).
    #[arg(long)]
    application: Option<String>,

    /// Encoder complexity, 0 to 10 (overrides the config file).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=10))]
    complexity: Option<u8>,

    /// JSON settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the preset table as JSON and exit.
    #[arg(long)]
    list_presets: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.list_presets {
        println!("{}", presets_json()?);
        return Ok(());
    }

    let preset: MorphPreset = cli.preset.parse()?;
    let settings = resolve_settings(&cli)?;
    let (input, output) = match (&cli.input, &cli.output) {
        (Some(input), Some(output)) => (input, output),
        _ => return Err("Input and output files are required".into()),
    };
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }

    morph_file(input, output, preset, settings)
}

fn morph_file(
    input: &Path,
    output: &Path,
    preset: MorphPreset,
    settings: MorphSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(input)?;
    log::info!(
        "Morphing {} ({} bytes) with preset '{preset}' at {} bit/s",
        input.display(),
        bytes.len(),
        settings.encoder.bitrate
    );

    let morphed = TranscodeJob::new(bytes, preset, settings)
        .with_logger(Box::new(StdoutPipelineLogger::new()))
        .run()?;

    fs::write(output, &morphed)?;
    log::info!("Output written to {}", output.display());
    Ok(())
}

/// Config file first, then command-line overrides.
fn resolve_settings(cli: &Cli) -> Result<MorphSettings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => MorphSettings::default(),
    };
    if let Some(bitrate) = cli.bitrate {
        settings.encoder.bitrate = bitrate;
    }
    if let Some(application) = &cli.application {
        settings.encoder.application = application.parse::<OpusApplication>()?;
    }
    if let Some(complexity) = cli.complexity {
        settings.encoder.complexity = complexity;
    }

    let bitrate = settings.encoder.bitrate;
    if !(MIN_BITRATE..=MAX_BITRATE).contains(&bitrate) {
        return Err(format!(
            "Bitrate must be between {MIN_BITRATE} and {MAX_BITRATE}, got {bitrate}"
        )
        .into());
    }
    let complexity = settings.encoder.complexity;
    if complexity > MAX_COMPLEXITY {
        return Err(format!("Complexity must be between 0 and {MAX_COMPLEXITY}, got {complexity}").into());
    }
    Ok(settings)
}

fn load_settings(path: &Path) -> Result<MorphSettings, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config {}: {e}", path.display()))?;
    let settings = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
    Ok(settings)
}

fn presets_json() -> Result<String, serde_json::Error> {
    let table: Vec<_> = MorphPreset::ALL
        .iter()
        .map(|preset| {
            serde_json::json!({
                "id": preset.id(),
                "name": preset,
                "description": preset.description(),
                "params": preset.params(),
            })
        })
        .collect();
    serde_json::to_string_pretty(&table)
}
