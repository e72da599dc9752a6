use crate::error::{AcquisitionError, Result};
use crate::filter::PassbandFilter;
use crate::vector;

/// Despread a segment and return its energy
///
/// `Σ (reference[i] · segment[i])²`
pub fn despread_energy(reference: &[f64], segment: &[f64]) -> Result<f64> {
    let product = vector::multiply(reference, segment)?;
    Ok(vector::energy(&product))
}

/// Despread → narrowband filter → square → lowpass → integrate
///
/// Holds scratch buffers so repeated evaluations during a search do not
/// reallocate. Results do not depend on previous calls.
pub struct EnergyPipeline<'a> {
    narrowband: &'a PassbandFilter,
    lowpass: &'a PassbandFilter,
    product: Vec<f64>,
    narrow: Vec<f64>,
    smoothed: Vec<f64>,
}

impl<'a> EnergyPipeline<'a> {
    pub fn new(narrowband: &'a PassbandFilter, lowpass: &'a PassbandFilter) -> Self {
        Self {
            narrowband,
            lowpass,
            product: Vec::new(),
            narrow: Vec::new(),
            smoothed: Vec::new(),
        }
    }

    /// Energy of `segment` despread by `spread_reference`
    pub fn energy(&mut self, segment: &[f64], spread_reference: &[f64]) -> Result<f64> {
        if spread_reference.is_empty() {
            return Err(AcquisitionError::NullInput("spread reference"));
        }

        vector::multiply_into(segment, spread_reference, &mut self.product)?;
        self.narrowband.apply_into(&self.product, &mut self.narrow)?;
        vector::square_in_place(&mut self.narrow);
        self.lowpass.apply_into(&self.narrow, &mut self.smoothed)?;

        Ok(vector::sum(&self.smoothed, 1.0))
    }
}

/// One-shot form of [`EnergyPipeline::energy`]
pub fn pipeline_energy(
    signal: &[f64],
    spread_signal: &[f64],
    narrowband_filter: &PassbandFilter,
    lowpass_filter: &PassbandFilter,
) -> Result<f64> {
    EnergyPipeline::new(narrowband_filter, lowpass_filter).energy(signal, spread_signal)
}
