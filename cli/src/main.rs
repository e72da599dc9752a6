mod config;
mod error;
mod wav;

use chipsync_core::kaiser::{self, FilterBands};
use chipsync_core::{calculate_thresholds, modulate_carrier, OffsetSearch};
use clap::{Parser, Subcommand, ValueEnum};
use config::AcquisitionConfig;
use error::{CliError, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "chipsync")]
#[command(about = "Locate a Gold-code spread reference inside a sampled capture")]
struct Cli {
    /// JSON acquisition settings; built-in defaults when omitted
    #[arg(short, long, global = true, value_name = "CONFIG.JSON")]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the baseband reference waveform to a WAV file
    Reference {
        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,
    },

    /// Write a test capture: the reference on the carrier at a known offset
    Synthesize {
        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Leading silence, in samples
        #[arg(long, default_value = "37")]
        offset: usize,

        /// Trailing silence, in samples
        #[arg(long, default_value = "200")]
        trailing: usize,

        /// Standard deviation of added Gaussian noise
        #[arg(long, default_value = "0.0")]
        noise: f64,

        /// Noise generator seed
        #[arg(long, default_value = "1")]
        seed: u64,
    },

    /// Print Kaiser filter parameters and taps as JSON
    Design {
        #[arg(value_enum)]
        filter: FilterKind,
    },

    /// Print despread energy statistics for a capture as JSON
    Calibrate {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Test every Nth offset
        #[arg(short, long, default_value = "1")]
        decimation: usize,

        /// Include every profile sample in the output
        #[arg(long)]
        full: bool,
    },

    /// Find the reference offset in a capture and print it as JSON
    Acquire {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Override the configured detection threshold
        #[arg(short, long)]
        threshold: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterKind {
    Narrowband,
    Lowpass,
}

#[derive(Serialize)]
struct DesignReport {
    filter: &'static str,
    attenuation: f64,
    alpha: f64,
    number_of_taps: usize,
    coefficients: Vec<f64>,
}

#[derive(Serialize)]
struct CalibrationReport {
    offsets: usize,
    decimation: usize,
    max: Option<f64>,
    mean: Option<f64>,
    peak_offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<Vec<f64>>,
}

#[derive(Serialize)]
struct AcquisitionReport {
    offset: usize,
    energy: f64,
    threshold: f64,
    ranges: Vec<[usize; 2]>,
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let config = AcquisitionConfig::load(cli.config.as_deref())?;
    debug!("Using {:?}", config);

    match cli.command {
        Commands::Reference { output } => reference_command(&config, &output)?,
        Commands::Synthesize {
            output,
            offset,
            trailing,
            noise,
            seed,
        } => synthesize_command(&config, &output, offset, trailing, noise, seed)?,
        Commands::Design { filter } => design_command(&config, filter)?,
        Commands::Calibrate {
            input,
            decimation,
            full,
        } => calibrate_command(&config, &input, decimation, full)?,
        Commands::Acquire { input, threshold } => acquire_command(&config, &input, threshold)?,
    }

    Ok(())
}

fn reference_command(config: &AcquisitionConfig, output: &Path) -> Result<()> {
    let reference = config.reference()?;
    wav::write_samples(output, &reference, config.sample_rate)?;

    println!(
        "Wrote {} chips ({} samples) to {}",
        config.code.chips,
        reference.len(),
        output.display()
    );
    Ok(())
}

fn synthesize_command(
    config: &AcquisitionConfig,
    output: &Path,
    offset: usize,
    trailing: usize,
    noise: f64,
    seed: u64,
) -> Result<()> {
    let reference = config.reference()?;
    let fs = config.sampling_frequency();

    // Carrier phase continues from sample 0 of the capture
    let phase = 2.0 * PI * config.carrier_hz * offset as f64 / fs;
    let mut capture = vec![0.0; offset];
    capture.extend(modulate_carrier(&reference, config.carrier_hz, fs, phase)?);
    capture.extend(std::iter::repeat(0.0).take(trailing));

    if noise > 0.0 {
        let normal = Normal::new(0.0, noise).map_err(|e| CliError::InvalidArgument(e.to_string()))?;
        let mut rng = StdRng::seed_from_u64(seed);
        for sample in capture.iter_mut() {
            *sample += normal.sample(&mut rng);
        }
    } else if noise < 0.0 || noise.is_nan() {
        return Err(CliError::InvalidArgument(format!("noise {} must be >= 0", noise)));
    }

    wav::write_samples(output, &capture, config.sample_rate)?;

    println!(
        "Wrote {} samples to {} (reference at offset {})",
        capture.len(),
        output.display(),
        offset
    );
    Ok(())
}

fn design_command(config: &AcquisitionConfig, filter: FilterKind) -> Result<()> {
    let (name, bands) = match filter {
        FilterKind::Narrowband => (
            "narrowband",
            FilterBands::BandPass {
                first_stopband: config.narrowband.first_stopband,
                first_passband: config.narrowband.first_passband,
                second_passband: config.narrowband.second_passband,
                second_stopband: config.narrowband.second_stopband,
            },
        ),
        FilterKind::Lowpass => (
            "lowpass",
            FilterBands::LowPass {
                passband: config.lowpass.passband,
                stopband: config.lowpass.stopband,
            },
        ),
    };

    let params = kaiser::kaiser_parameters(
        &bands,
        config.passband_attenuation,
        config.stopband_attenuation,
        config.sampling_frequency(),
    )?;
    let designed = kaiser::design(
        bands,
        config.passband_attenuation,
        config.stopband_attenuation,
        config.sampling_frequency(),
    )?;

    let report = DesignReport {
        filter: name,
        attenuation: params.attenuation,
        alpha: params.alpha,
        number_of_taps: designed.number_of_taps(),
        coefficients: designed.coefficients().to_vec(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Read a capture and check it matches the configured sample rate
fn load_capture(config: &AcquisitionConfig, input: &Path) -> Result<Vec<f64>> {
    let (samples, sample_rate) = wav::read_samples(input)?;
    if sample_rate != config.sample_rate {
        return Err(CliError::SampleRateMismatch {
            expected: config.sample_rate,
            actual: sample_rate,
        });
    }

    info!("Read {} samples from {}", samples.len(), input.display());
    Ok(samples)
}

fn calibrate_command(config: &AcquisitionConfig, input: &Path, decimation: usize, full: bool) -> Result<()> {
    let capture = load_capture(config, input)?;
    let reference = config.reference()?;

    let profile = calculate_thresholds(&reference, &capture, decimation)?;

    let report = CalibrationReport {
        offsets: profile.len(),
        decimation: profile.decimation(),
        max: profile.max(),
        mean: profile.mean(),
        peak_offset: profile.peak_offset(),
        profile: full.then(|| profile.samples().to_vec()),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn acquire_command(config: &AcquisitionConfig, input: &Path, threshold: Option<f64>) -> Result<()> {
    let capture = load_capture(config, input)?;
    let reference = config.reference()?;
    let narrowband = config.narrowband_filter()?;
    let lowpass = config.lowpass_filter()?;
    let threshold = threshold.unwrap_or(config.threshold);

    let search = OffsetSearch::new(&narrowband, &lowpass, config.search_config())?;
    let outcome = search.run(&capture, &reference, threshold)?;
    info!(
        "Reference found at offset {} (energy {:.3})",
        outcome.offset, outcome.energy
    );

    let report = AcquisitionReport {
        offset: outcome.offset,
        energy: outcome.energy,
        threshold,
        ranges: outcome
            .ranges
            .iter()
            .map(|r| [r.start_index, r.end_index])
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
