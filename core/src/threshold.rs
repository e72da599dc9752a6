use crate::energy::despread_energy;
use crate::error::{AcquisitionError, Result};
use log::debug;

/// Despread energy sampled every `decimation` offsets
///
/// Entry `k` is the energy at signal offset `k * decimation`. Picking a
/// detection threshold from the profile is left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyProfile {
    samples: Vec<f64>,
    decimation: usize,
}

impl EnergyProfile {
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn decimation(&self) -> usize {
        self.decimation
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Signal offset that profile entry `index` was measured at
    pub fn offset_of(&self, index: usize) -> usize {
        index * self.decimation
    }

    pub fn max(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::max)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
        }
    }

    /// Offset of the largest entry (first one on ties)
    pub fn peak_offset(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &e) in self.samples.iter().enumerate() {
            if best.map_or(true, |(_, b)| e > b) {
                best = Some((i, e));
            }
        }
        best.map(|(i, _)| self.offset_of(i))
    }
}

/// Scan `signal` at a coarse stride and record despread energy at each offset
///
/// Tests offsets `0, decimation, 2·decimation, … < signal.len() - code.len()`.
/// Any failure aborts the whole scan.
pub fn calculate_thresholds(
    spreading_code_signal: &[f64],
    signal: &[f64],
    decimation: usize,
) -> Result<EnergyProfile> {
    if spreading_code_signal.is_empty() {
        return Err(AcquisitionError::NullInput("spreading code signal"));
    }

    if decimation == 0 {
        return Err(AcquisitionError::InvalidParameter(
            "decimation must be > 0".to_string(),
        ));
    }

    let code_len = spreading_code_signal.len();
    if signal.len() <= code_len {
        return Err(AcquisitionError::InvalidParameter(format!(
            "signal of {} samples leaves no offsets to test for a {} sample code",
            signal.len(),
            code_len
        )));
    }

    let num_tests = signal.len() - code_len;
    let samples = (0..num_tests)
        .step_by(decimation)
        .map(|i| despread_energy(spreading_code_signal, &signal[i..i + code_len]))
        .collect::<Result<Vec<f64>>>()?;

    debug!(
        "Calibrated {} offsets (decimation {}) over {} samples",
        samples.len(),
        decimation,
        signal.len()
    );

    Ok(EnergyProfile {
        samples,
        decimation,
    })
}
