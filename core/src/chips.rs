use crate::error::{AcquisitionError, Result};
use std::f64::consts::PI;

/// Expand packed code bits into a ±1 reference waveform
///
/// Bits are read MSB-first from `code_bytes` (the layout produced by
/// `SpreadingCode::get_bits` and `GoldCode::get_code`). Each bit becomes one
/// chip of `samples_per_chip` samples: 1 maps to +1.0, 0 maps to -1.0.
///
/// Output length is `n_bits * samples_per_chip`.
pub fn chip_waveform(code_bytes: &[u8], n_bits: usize, samples_per_chip: usize) -> Result<Vec<f64>> {
    if samples_per_chip == 0 {
        return Err(AcquisitionError::InvalidParameter(
            "samples per chip must be > 0".to_string(),
        ));
    }

    if n_bits == 0 {
        return Err(AcquisitionError::InvalidParameter(
            "bit count must be > 0".to_string(),
        ));
    }

    let needed = n_bits.div_ceil(8);
    if code_bytes.len() < needed {
        return Err(AcquisitionError::LengthMismatch {
            expected: needed,
            actual: code_bytes.len(),
        });
    }

    let mut waveform = Vec::with_capacity(n_bits * samples_per_chip);
    for i in 0..n_bits {
        let bit = (code_bytes[i / 8] >> (7 - i % 8)) & 1;
        let chip = if bit == 1 { 1.0 } else { -1.0 };

        for _ in 0..samples_per_chip {
            waveform.push(chip);
        }
    }

    Ok(waveform)
}

/// Mix a baseband waveform onto a cosine carrier (BPSK)
///
/// `sample[i] = waveform[i] * cos(2π·carrier_hz·i/fs + phase)`
pub fn modulate_carrier(
    waveform: &[f64],
    carrier_hz: f64,
    sampling_frequency: f64,
    phase: f64,
) -> Result<Vec<f64>> {
    if sampling_frequency <= 0.0 {
        return Err(AcquisitionError::InvalidParameter(format!(
            "sampling frequency {} must be > 0",
            sampling_frequency
        )));
    }

    if carrier_hz < 0.0 || carrier_hz >= sampling_frequency / 2.0 {
        return Err(AcquisitionError::InvalidParameter(format!(
            "carrier {} Hz outside [0, {}) Hz",
            carrier_hz,
            sampling_frequency / 2.0
        )));
    }

    let step = 2.0 * PI * carrier_hz / sampling_frequency;
    Ok(waveform
        .iter()
        .enumerate()
        .map(|(i, &chip)| chip * (step * i as f64 + phase).cos())
        .collect())
}
