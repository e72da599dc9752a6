use crate::error::{AcquisitionError, Result};

/// How per-range refinement results are combined into one offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeAggregation {
    /// Every range overwrites the previous result; the last range wins
    LastRange,
    /// Keep the refined offset with the largest pipeline energy
    BestEnergy,
}

// Later ranges silently replace earlier ones. Whether that was intended
// upstream is unknown; switch to BestEnergy to compare.
pub const DEFAULT_RANGE_AGGREGATION: RangeAggregation = RangeAggregation::LastRange;

/// Tuning for the offset search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Stride of the coarse range-discovery scan, in samples
    pub step_size: usize,
    /// Relative energy difference under which the curve counts as flat
    pub exhaustive_difference: f64,
    /// Stride of the exhaustive fallback scan
    pub exhaustive_decimation: usize,
    pub aggregation: RangeAggregation,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            step_size: 16,
            exhaustive_difference: 0.05,
            exhaustive_decimation: 1,
            aggregation: DEFAULT_RANGE_AGGREGATION,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.step_size == 0 {
            return Err(AcquisitionError::InvalidParameter(
                "step size must be > 0".to_string(),
            ));
        }

        if self.exhaustive_decimation == 0 {
            return Err(AcquisitionError::InvalidParameter(
                "exhaustive decimation must be > 0".to_string(),
            ));
        }

        if !(self.exhaustive_difference >= 0.0 && self.exhaustive_difference.is_finite()) {
            return Err(AcquisitionError::InvalidParameter(format!(
                "exhaustive difference {} must be a finite value >= 0",
                self.exhaustive_difference
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.aggregation, RangeAggregation::LastRange);
    }

    #[test]
    fn test_rejects_zero_strides() {
        let config = SearchConfig {
            step_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SearchConfig {
            exhaustive_decimation: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_difference() {
        for bad in [-0.1, f64::NAN, f64::INFINITY] {
            let config = SearchConfig {
                exhaustive_difference: bad,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(AcquisitionError::InvalidParameter(_))
            ));
        }
    }
}
