use crate::error::{CliError, Result};
use hound::{SampleFormat, WavSpec};
use std::path::Path;

/// Mono 32-bit float WAV
pub fn write_samples(path: &Path, samples: &[f64], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample as f32)?;
    }
    writer.finalize()?;

    Ok(())
}

/// Read a mono capture as `f64` in roughly [-1, 1], along with its sample rate
///
/// Accepts 16-bit PCM and 32-bit float.
pub fn read_samples(path: &Path) -> Result<(Vec<f64>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(CliError::UnsupportedFormat(format!(
            "{} channels (mono required)",
            spec.channels
        )));
    }

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|s| s as f64 / 32768.0))
            .collect::<std::result::Result<Vec<f64>, _>>()?,
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<f64>, _>>()?,
        (format, bits) => {
            return Err(CliError::UnsupportedFormat(format!(
                "{:?} with {} bits per sample",
                format, bits
            )));
        }
    };

    Ok((samples, spec.sample_rate))
}
