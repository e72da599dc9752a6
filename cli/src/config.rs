//! JSON acquisition settings
//!
//! Every field has a default, so a config file only needs the values it
//! changes. The defaults describe a 31-chip degree-5 Gold code at 8
//! samples per chip on a 1 kHz carrier sampled at 8 kHz.

use crate::error::Result;
use chipsync_core::gold::{PREFERRED_PAIR_5_POLY_1, PREFERRED_PAIR_5_POLY_2};
use chipsync_core::{
    chip_waveform, kaiser, GoldCode, PassbandFilter, RangeAggregation, SearchConfig,
    DEFAULT_PASSBAND_RIPPLE_DB, DEFAULT_STOPBAND_ATTENUATION_DB,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    pub degree: u32,
    pub first_polynomial: u32,
    pub second_polynomial: u32,
    pub first_seed: u32,
    pub second_seed: u32,
    pub chips: usize,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            degree: 5,
            first_polynomial: PREFERRED_PAIR_5_POLY_1,
            second_polynomial: PREFERRED_PAIR_5_POLY_2,
            first_seed: 0xF800_0000,
            second_seed: 0xF800_0000,
            chips: 31,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandPassConfig {
    pub first_stopband: f64,
    pub first_passband: f64,
    pub second_passband: f64,
    pub second_stopband: f64,
}

impl Default for BandPassConfig {
    fn default() -> Self {
        Self {
            first_stopband: 600.0,
            first_passband: 900.0,
            second_passband: 1100.0,
            second_stopband: 1400.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowPassConfig {
    pub passband: f64,
    pub stopband: f64,
}

impl Default for LowPassConfig {
    fn default() -> Self {
        Self {
            passband: 200.0,
            stopband: 600.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    LastRange,
    BestEnergy,
}

impl From<Aggregation> for RangeAggregation {
    fn from(value: Aggregation) -> Self {
        match value {
            Aggregation::LastRange => RangeAggregation::LastRange,
            Aggregation::BestEnergy => RangeAggregation::BestEnergy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub step_size: usize,
    pub exhaustive_difference: f64,
    pub exhaustive_decimation: usize,
    pub aggregation: Aggregation,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            step_size: 4,
            exhaustive_difference: 0.05,
            exhaustive_decimation: 1,
            aggregation: Aggregation::LastRange,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub sample_rate: u32,
    pub carrier_hz: f64,
    pub samples_per_chip: usize,
    pub code: CodeConfig,
    pub narrowband: BandPassConfig,
    pub lowpass: LowPassConfig,
    pub passband_attenuation: f64,
    pub stopband_attenuation: f64,
    pub threshold: f64,
    pub search: SearchSettings,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            carrier_hz: 1000.0,
            samples_per_chip: 8,
            code: CodeConfig::default(),
            narrowband: BandPassConfig::default(),
            lowpass: LowPassConfig::default(),
            passband_attenuation: DEFAULT_PASSBAND_RIPPLE_DB,
            stopband_attenuation: DEFAULT_STOPBAND_ATTENUATION_DB,
            threshold: 60.0,
            search: SearchSettings::default(),
        }
    }
}

impl AcquisitionConfig {
    /// Load from a JSON file, or use defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&text)?)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn sampling_frequency(&self) -> f64 {
        self.sample_rate as f64
    }

    pub fn gold_code(&self) -> Result<GoldCode> {
        let code = &self.code;
        Ok(GoldCode::new(
            code.degree,
            code.first_polynomial,
            code.second_polynomial,
            code.first_seed,
            code.second_seed,
        )?)
    }

    /// Baseband ±1 reference waveform
    pub fn reference(&self) -> Result<Vec<f64>> {
        let mut gold = self.gold_code()?;
        let bits = gold.get_code(self.code.chips)?;
        Ok(chip_waveform(&bits, self.code.chips, self.samples_per_chip)?)
    }

    pub fn narrowband_filter(&self) -> Result<PassbandFilter> {
        let nb = &self.narrowband;
        Ok(kaiser::bandpass(
            nb.first_stopband,
            nb.first_passband,
            nb.second_passband,
            nb.second_stopband,
            self.passband_attenuation,
            self.stopband_attenuation,
            self.sampling_frequency(),
        )?)
    }

    pub fn lowpass_filter(&self) -> Result<PassbandFilter> {
        Ok(kaiser::lowpass(
            self.lowpass.passband,
            self.lowpass.stopband,
            self.passband_attenuation,
            self.stopband_attenuation,
            self.sampling_frequency(),
        )?)
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            step_size: self.search.step_size,
            exhaustive_difference: self.search.exhaustive_difference,
            exhaustive_decimation: self.search.exhaustive_decimation,
            aggregation: self.search.aggregation.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AcquisitionConfig =
            serde_json::from_str(r#"{"threshold": 12.5, "search": {"aggregation": "best_energy"}}"#)
                .unwrap();

        assert_eq!(config.threshold, 12.5);
        assert_eq!(config.search.aggregation, Aggregation::BestEnergy);
        assert_eq!(config.search.step_size, 4);
        assert_eq!(config.code, CodeConfig::default());
        assert_eq!(config.sample_rate, 8000);
    }

    #[test]
    fn test_default_reference_length() {
        let config = AcquisitionConfig::default();
        assert_eq!(config.reference().unwrap().len(), 31 * 8);
    }

    #[test]
    fn test_default_filters_design() {
        let config = AcquisitionConfig::default();
        assert_eq!(config.narrowband_filter().unwrap().number_of_taps(), 61);
        assert_eq!(config.lowpass_filter().unwrap().number_of_taps(), 47);
    }

    #[test]
    fn test_search_config_conversion() {
        let mut config = AcquisitionConfig::default();
        config.search.aggregation = Aggregation::BestEnergy;
        let search = config.search_config();
        assert_eq!(search.aggregation, RangeAggregation::BestEnergy);
        assert!(search.validate().is_ok());
    }

    #[test]
    fn test_invalid_code_surfaces_core_error() {
        let mut config = AcquisitionConfig::default();
        config.code.degree = 1;
        assert!(config.reference().is_err());
    }

    #[test]
    fn test_unknown_aggregation_is_rejected() {
        let result: std::result::Result<AcquisitionConfig, _> =
            serde_json::from_str(r#"{"search": {"aggregation": "first_range"}}"#);
        assert!(result.is_err());
    }
}
