//! Direct-sequence spread-spectrum acquisition
//!
//! Generates LFSR and Gold spreading codes, designs Kaiser-window FIR
//! filters, and locates a known spread reference inside a sampled capture
//! by searching for the offset with the highest despread energy.

pub mod error;
pub mod vector;
pub mod lfsr;
pub mod gold;
pub mod chips;
pub mod filter;
pub mod kaiser;
pub mod energy;
pub mod threshold;
pub mod config;
pub mod search;

pub use chips::{chip_waveform, modulate_carrier};
pub use config::{RangeAggregation, SearchConfig, DEFAULT_RANGE_AGGREGATION};
pub use energy::{despread_energy, pipeline_energy, EnergyPipeline};
pub use error::{AcquisitionError, Result};
pub use filter::PassbandFilter;
pub use gold::GoldCode;
pub use kaiser::{FilterBands, KaiserParameters};
pub use lfsr::SpreadingCode;
pub use search::{find_offset, OffsetSearch, Range, SearchOutcome};
pub use threshold::{calculate_thresholds, EnergyProfile};

// Kaiser design defaults
pub const DEFAULT_PASSBAND_RIPPLE_DB: f64 = 0.5;
pub const DEFAULT_STOPBAND_ATTENUATION_DB: f64 = 40.0;
