//! Passband FIR filter: immutable taps plus band metadata
//!
//! Filters are designed once (see `kaiser`) and applied many times during
//! acquisition. Application is a full causal correlation whose output is
//! `signal.len() + number_of_taps` samples long; the final sample is always
//! zero because no input overlaps it.

use crate::error::{AcquisitionError, Result};
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq)]
pub struct PassbandFilter {
    first_passband: f64,
    second_passband: f64,
    sampling_frequency: f64,
    coefficients: Vec<f64>,
}

impl PassbandFilter {
    /// Allocate a filter with `number_of_taps` zero coefficients
    ///
    /// Requires `0 < first_passband < second_passband` and a positive
    /// sampling frequency.
    pub fn new(
        first_passband: f64,
        second_passband: f64,
        sampling_frequency: f64,
        number_of_taps: usize,
    ) -> Result<Self> {
        Self::from_coefficients(
            first_passband,
            second_passband,
            sampling_frequency,
            vec![0.0; number_of_taps],
        )
    }

    /// Wrap externally designed coefficients
    pub fn from_coefficients(
        first_passband: f64,
        second_passband: f64,
        sampling_frequency: f64,
        coefficients: Vec<f64>,
    ) -> Result<Self> {
        if !(first_passband > 0.0 && first_passband < second_passband) {
            return Err(AcquisitionError::InvalidParameter(format!(
                "passband edges must satisfy 0 < {} < {}",
                first_passband, second_passband
            )));
        }

        Self::checked(first_passband, second_passband, sampling_frequency, coefficients)
    }

    /// Low-pass filters carry `second_passband == 0` and skip the band-order check
    pub(crate) fn lowpass_from_coefficients(
        passband: f64,
        sampling_frequency: f64,
        coefficients: Vec<f64>,
    ) -> Result<Self> {
        if passband <= 0.0 {
            return Err(AcquisitionError::InvalidParameter(format!(
                "passband {} must be > 0",
                passband
            )));
        }

        Self::checked(passband, 0.0, sampling_frequency, coefficients)
    }

    fn checked(
        first_passband: f64,
        second_passband: f64,
        sampling_frequency: f64,
        coefficients: Vec<f64>,
    ) -> Result<Self> {
        if sampling_frequency <= 0.0 || !sampling_frequency.is_finite() {
            return Err(AcquisitionError::InvalidParameter(format!(
                "sampling frequency {} must be > 0",
                sampling_frequency
            )));
        }

        if coefficients.is_empty() {
            return Err(AcquisitionError::InvalidParameter(
                "number of taps must be > 0".to_string(),
            ));
        }

        Ok(Self {
            first_passband,
            second_passband,
            sampling_frequency,
            coefficients,
        })
    }

    /// Filter `signal`, returning `signal.len() + number_of_taps` samples
    pub fn apply(&self, signal: &[f64]) -> Result<Vec<f64>> {
        let mut out = Vec::new();
        self.apply_into(signal, &mut out)?;
        Ok(out)
    }

    /// Same as [`apply`](Self::apply) but writes into a reusable buffer
    pub fn apply_into(&self, signal: &[f64], out: &mut Vec<f64>) -> Result<()> {
        if signal.is_empty() {
            return Err(AcquisitionError::InvalidParameter(
                "cannot filter an empty signal".to_string(),
            ));
        }

        let taps = self.coefficients.len();
        let n = signal.len();

        out.clear();
        out.resize(n + taps, 0.0);

        // out[i] = sum_j signal[j] * coefficients[i - j]
        for (i, y) in out.iter_mut().enumerate().take(n + taps - 1) {
            let j_start = (i + 1).saturating_sub(taps);
            let j_end = i.min(n - 1);
            let mut acc = 0.0;
            for j in j_start..=j_end {
                acc += signal[j] * self.coefficients[i - j];
            }
            *y = acc;
        }

        Ok(())
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub(crate) fn coefficients_mut(&mut self) -> &mut [f64] {
        &mut self.coefficients
    }

    pub fn number_of_taps(&self) -> usize {
        self.coefficients.len()
    }

    pub fn first_passband(&self) -> f64 {
        self.first_passband
    }

    pub fn second_passband(&self) -> f64 {
        self.second_passband
    }

    pub fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    pub fn is_lowpass(&self) -> bool {
        self.second_passband == 0.0
    }

    /// Delay of a linear-phase design, in samples
    pub fn group_delay(&self) -> usize {
        (self.coefficients.len() - 1) / 2
    }

    /// Sum of the taps (response at 0 Hz)
    pub fn dc_gain(&self) -> f64 {
        self.coefficients.iter().sum()
    }

    /// Magnitude response at `freq_hz`
    pub fn frequency_response(&self, freq_hz: f64) -> f64 {
        let w = 2.0 * PI * freq_hz / self.sampling_frequency;
        let (re, im) = self
            .coefficients
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(re, im), (k, &c)| {
                let phase = w * k as f64;
                (re + c * phase.cos(), im - c * phase.sin())
            });
        (re * re + im * im).sqrt()
    }
}
