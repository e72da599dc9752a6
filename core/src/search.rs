//! Offset search: locate where a spread reference sits inside a capture
//!
//! Three stages:
//!
//! 1. **Range discovery**: a coarse scan every `step_size` samples marks
//!    contiguous runs whose pipeline energy meets the threshold.
//! 2. **Refinement**: each run is narrowed by comparing energy at the
//!    quarter points and keeping the half that is rising. When the two
//!    energies are within `exhaustive_difference` of each other the curve is
//!    too flat to trust, so the remaining interval is scanned exhaustively
//!    every `exhaustive_decimation` samples.
//! 3. **Aggregation**: per-range results are combined according to
//!    [`RangeAggregation`].
//!
//! Stages 1 and 2 are generic over the energy function so they can be
//! driven by synthetic curves as well as the real despread pipeline.

use crate::config::{RangeAggregation, SearchConfig};
use crate::energy::EnergyPipeline;
use crate::error::{AcquisitionError, Result};
use crate::filter::PassbandFilter;
use log::{debug, trace};

/// Contiguous span of offsets whose energy met the threshold
///
/// `start_index` is the first offset that met it; `end_index` is the first
/// scanned offset after the run that did not (or the scan length).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start_index: usize,
    pub end_index: usize,
}

impl Range {
    pub fn new(start_index: usize, end_index: usize) -> Result<Self> {
        if end_index < start_index {
            return Err(AcquisitionError::InvalidParameter(format!(
                "range end {} precedes start {}",
                end_index, start_index
            )));
        }

        Ok(Self {
            start_index,
            end_index,
        })
    }

    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }
}

/// Refined offset together with the energy measured there
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub offset: usize,
    pub energy: f64,
}

/// Result of a full search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub offset: usize,
    pub energy: f64,
    pub ranges: Vec<Range>,
}

/// Scan offsets `0, step, 2·step, … < number_of_tests` for runs at or above `threshold`
pub fn find_ranges<F>(
    number_of_tests: usize,
    step_size: usize,
    threshold: f64,
    mut energy_at: F,
) -> Result<Vec<Range>>
where
    F: FnMut(usize) -> Result<f64>,
{
    if step_size == 0 {
        return Err(AcquisitionError::InvalidParameter(
            "step size must be > 0".to_string(),
        ));
    }

    if threshold.is_nan() {
        return Err(AcquisitionError::InvalidParameter(
            "threshold must be a number".to_string(),
        ));
    }

    let mut ranges = Vec::new();
    let mut run_start: Option<usize> = None;

    for offset in (0..number_of_tests).step_by(step_size) {
        let above = energy_at(offset)? >= threshold;

        match (above, run_start) {
            (true, None) => run_start = Some(offset),
            (false, Some(start)) => {
                ranges.push(Range::new(start, offset)?);
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        ranges.push(Range::new(start, number_of_tests)?);
    }

    Ok(ranges)
}

/// The two quarter-point energies are close enough that bisection could skip the peak
fn is_flat(e_low: f64, e_high: f64, exhaustive_difference: f64) -> bool {
    if e_high == 0.0 {
        return true;
    }

    let relative = (e_high - e_low).abs() / e_high;
    !relative.is_finite() || relative <= exhaustive_difference
}

/// Highest-energy offset in `[start, end)` at the given stride
///
/// Ties keep the lowest offset. An empty interval evaluates `start` alone.
fn exhaustive_scan<F>(start: usize, end: usize, decimation: usize, energy_at: &mut F) -> Result<Peak>
where
    F: FnMut(usize) -> Result<f64>,
{
    let mut best = Peak {
        offset: start,
        energy: energy_at(start)?,
    };

    for offset in (start..end).step_by(decimation).skip(1) {
        let energy = energy_at(offset)?;
        if energy > best.energy {
            best = Peak { offset, energy };
        }
    }

    Ok(best)
}

/// Pinpoint the energy maximum inside `range`
///
/// Any energy evaluation failure, including inside the exhaustive scan,
/// fails the whole refinement.
pub fn find_max<F>(
    range: Range,
    exhaustive_difference: f64,
    exhaustive_decimation: usize,
    energy_at: &mut F,
) -> Result<Peak>
where
    F: FnMut(usize) -> Result<f64>,
{
    if exhaustive_decimation == 0 {
        return Err(AcquisitionError::InvalidParameter(
            "exhaustive decimation must be > 0".to_string(),
        ));
    }

    // A width-1 interval only terminates if a zero difference reads as flat
    if !(exhaustive_difference >= 0.0 && exhaustive_difference.is_finite()) {
        return Err(AcquisitionError::InvalidParameter(format!(
            "exhaustive difference {} must be a finite value >= 0",
            exhaustive_difference
        )));
    }

    let (mut start, mut end) = (range.start_index, range.end_index);

    loop {
        let mid = start + (end - start) / 2;
        let low = start + (mid - start) / 2;
        let high = mid + (end - mid) / 2;

        let e_low = energy_at(low)?;
        let e_high = energy_at(high)?;
        trace!(
            "refine [{}, {}]: E({})={:.4e} E({})={:.4e}",
            start,
            end,
            low,
            e_low,
            high,
            e_high
        );

        if is_flat(e_low, e_high, exhaustive_difference) {
            return exhaustive_scan(start, end, exhaustive_decimation, energy_at);
        }

        if e_high > e_low {
            start = mid;
        } else {
            end = mid;
        }
    }
}

/// Acquisition engine bound to a pair of filters and a search configuration
pub struct OffsetSearch<'a> {
    narrowband: &'a PassbandFilter,
    lowpass: &'a PassbandFilter,
    config: SearchConfig,
}

impl<'a> OffsetSearch<'a> {
    pub fn new(
        narrowband: &'a PassbandFilter,
        lowpass: &'a PassbandFilter,
        config: SearchConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            narrowband,
            lowpass,
            config,
        })
    }

    /// Find the offset at which `spread_reference` is embedded in `signal`
    pub fn run(&self, signal: &[f64], spread_reference: &[f64], threshold: f64) -> Result<SearchOutcome> {
        if spread_reference.is_empty() {
            return Err(AcquisitionError::NullInput("spread reference"));
        }

        if signal.is_empty() {
            return Err(AcquisitionError::NullInput("signal"));
        }

        let window = spread_reference.len();
        if signal.len() <= window {
            return Err(AcquisitionError::InvalidParameter(format!(
                "signal of {} samples leaves no offsets to test for a {} sample reference",
                signal.len(),
                window
            )));
        }

        let number_of_tests = signal.len() - window;
        let mut pipeline = EnergyPipeline::new(self.narrowband, self.lowpass);
        let mut energy_at = |offset: usize| -> Result<f64> {
            if offset > number_of_tests {
                return Err(AcquisitionError::InvalidParameter(format!(
                    "offset {} beyond last testable offset {}",
                    offset, number_of_tests
                )));
            }
            pipeline.energy(&signal[offset..offset + window], spread_reference)
        };

        let ranges = find_ranges(number_of_tests, self.config.step_size, threshold, &mut energy_at)?;
        debug!(
            "Found {} range(s) at threshold {:.4e}: {:?}",
            ranges.len(),
            threshold,
            ranges
        );

        if ranges.is_empty() {
            return Err(AcquisitionError::NoResult);
        }

        let mut result: Option<Peak> = None;
        for range in &ranges {
            let peak = find_max(
                *range,
                self.config.exhaustive_difference,
                self.config.exhaustive_decimation,
                &mut energy_at,
            )?;
            debug!(
                "Range [{}, {}) refined to offset {} (energy {:.4e})",
                range.start_index, range.end_index, peak.offset, peak.energy
            );

            result = match (self.config.aggregation, result) {
                (RangeAggregation::BestEnergy, Some(best)) if best.energy >= peak.energy => Some(best),
                _ => Some(peak),
            };
        }

        let peak = result.ok_or(AcquisitionError::NoResult)?;
        Ok(SearchOutcome {
            offset: peak.offset,
            energy: peak.energy,
            ranges,
        })
    }
}

/// Locate `spread_reference` inside `signal`
///
/// Convenience wrapper over [`OffsetSearch`] using the default aggregation.
#[allow(clippy::too_many_arguments)]
pub fn find_offset(
    signal: &[f64],
    spread_reference: &[f64],
    narrowband_filter: &PassbandFilter,
    lowpass_filter: &PassbandFilter,
    threshold: f64,
    step_size: usize,
    exhaustive_difference: f64,
    exhaustive_decimation: usize,
) -> Result<usize> {
    let config = SearchConfig {
        step_size,
        exhaustive_difference,
        exhaustive_decimation,
        ..Default::default()
    };

    OffsetSearch::new(narrowband_filter, lowpass_filter, config)?
        .run(signal, spread_reference, threshold)
        .map(|outcome| outcome.offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(peak: usize, height: f64) -> impl FnMut(usize) -> Result<f64> {
        move |offset| Ok((height - (offset as f64 - peak as f64).abs()).max(0.0))
    }

    #[test]
    fn test_range_new_rejects_inverted() {
        assert!(Range::new(5, 4).is_err());
        assert_eq!(Range::new(4, 4).unwrap().len(), 0);
    }

    #[test]
    fn test_find_ranges_two_runs() {
        // Above threshold on [10, 30) and [60, 75)
        let energy = |offset: usize| -> Result<f64> {
            Ok(if (10..30).contains(&offset) || (60..75).contains(&offset) {
                5.0
            } else {
                1.0
            })
        };

        let ranges = find_ranges(100, 5, 2.0, energy).unwrap();
        assert_eq!(
            ranges,
            vec![Range::new(10, 30).unwrap(), Range::new(60, 75).unwrap()]
        );
    }

    #[test]
    fn test_find_ranges_run_reaching_end() {
        let energy = |offset: usize| -> Result<f64> { Ok(if offset >= 40 { 3.0 } else { 0.0 }) };
        let ranges = find_ranges(50, 4, 3.0, energy).unwrap();
        assert_eq!(ranges, vec![Range::new(40, 50).unwrap()]);
    }

    #[test]
    fn test_find_ranges_threshold_is_inclusive() {
        let ranges = find_ranges(10, 1, 2.0, |_| Ok(2.0)).unwrap();
        assert_eq!(ranges, vec![Range::new(0, 10).unwrap()]);
    }

    #[test]
    fn test_find_ranges_none() {
        let ranges = find_ranges(100, 3, 1.0, |_| Ok(0.0)).unwrap();
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_find_ranges_zero_step() {
        assert!(find_ranges(100, 0, 1.0, |_| Ok(0.0)).is_err());
    }

    #[test]
    fn test_find_ranges_propagates_errors() {
        let result = find_ranges(100, 10, 1.0, |offset| {
            if offset == 50 {
                Err(AcquisitionError::NullInput("probe"))
            } else {
                Ok(2.0)
            }
        });
        assert_eq!(result, Err(AcquisitionError::NullInput("probe")));
    }

    #[test]
    fn test_find_max_triangle_bisection() {
        let mut energy = triangle(37, 64.0);
        let peak = find_max(Range::new(8, 72).unwrap(), 0.05, 1, &mut energy).unwrap();
        assert_eq!(peak.offset, 37);
        assert_eq!(peak.energy, 64.0);
    }

    #[test]
    fn test_find_max_flat_falls_back_to_exhaustive() {
        // Huge tolerance forces the exhaustive scan immediately
        let mut calls = 0;
        let mut energy = |offset: usize| -> Result<f64> {
            calls += 1;
            Ok(if offset == 13 { 10.0 } else { 1.0 })
        };
        let peak = find_max(Range::new(0, 20).unwrap(), 1.0, 1, &mut energy).unwrap();
        assert_eq!(peak.offset, 13);
        assert_eq!(calls, 2 + 20);
    }

    #[test]
    fn test_find_max_ties_keep_lowest_offset() {
        let mut energy = |offset: usize| -> Result<f64> { Ok(if offset >= 6 { 4.0 } else { 1.0 }) };
        let peak = find_max(Range::new(0, 12).unwrap(), 10.0, 1, &mut energy).unwrap();
        assert_eq!(peak.offset, 6);
    }

    #[test]
    fn test_find_max_zero_energy_is_flat() {
        let mut energy = |_offset: usize| -> Result<f64> { Ok(0.0) };
        let peak = find_max(Range::new(3, 9).unwrap(), 0.0, 1, &mut energy).unwrap();
        assert_eq!(peak.offset, 3);
        assert_eq!(peak.energy, 0.0);
    }

    #[test]
    fn test_find_max_degenerate_range() {
        let mut energy = triangle(5, 10.0);
        let peak = find_max(Range::new(5, 5).unwrap(), 0.05, 1, &mut energy).unwrap();
        assert_eq!(peak.offset, 5);
    }

    #[test]
    fn test_find_max_exhaustive_decimation_stride() {
        let mut energy = triangle(13, 50.0);
        let peak = find_max(Range::new(0, 40).unwrap(), 1.0, 4, &mut energy).unwrap();
        assert_eq!(peak.offset, 12);
    }

    #[test]
    fn test_find_max_exhaustive_failure_is_not_skipped() {
        let mut energy = |offset: usize| -> Result<f64> {
            if offset == 7 {
                Err(AcquisitionError::LengthMismatch {
                    expected: 1,
                    actual: 0,
                })
            } else {
                Ok(1.0)
            }
        };
        let result = find_max(Range::new(0, 16).unwrap(), 1.0, 1, &mut energy);
        assert!(matches!(result, Err(AcquisitionError::LengthMismatch { .. })));
    }

    #[test]
    fn test_find_max_zero_decimation() {
        let mut energy = triangle(5, 10.0);
        assert!(find_max(Range::new(0, 10).unwrap(), 0.05, 0, &mut energy).is_err());
    }

    #[test]
    fn test_find_max_rejects_bad_difference() {
        for bad in [-0.5, f64::NAN, f64::INFINITY] {
            let mut calls = 0;
            let mut energy = |offset: usize| -> Result<f64> {
                calls += 1;
                Ok(offset as f64)
            };
            let result = find_max(Range::new(0, 8).unwrap(), bad, 1, &mut energy);
            assert!(
                matches!(result, Err(AcquisitionError::InvalidParameter(_))),
                "difference {} accepted",
                bad
            );
            assert_eq!(calls, 0);
        }
    }

    #[test]
    fn test_find_max_zero_difference_terminates() {
        // Strictly rising curve never reads as flat until the interval collapses
        let mut energy = |offset: usize| -> Result<f64> { Ok(offset as f64 + 1.0) };
        let peak = find_max(Range::new(0, 8).unwrap(), 0.0, 1, &mut energy).unwrap();
        assert_eq!(peak.offset, 7);
    }
}
