//! Gold code generation from a preferred pair of m-sequences
//!
//! Each output bit is the XOR of the two underlying register outputs. Both
//! registers are always stepped together so the pair stays in lockstep.

use crate::error::{AcquisitionError, Result};
use crate::lfsr::SpreadingCode;

/// Degree-5 preferred pair: x^5 + x^2 + 1 (top-aligned)
pub const PREFERRED_PAIR_5_POLY_1: u32 = 0x2800_0000;
/// Degree-5 preferred pair: x^5 + x^4 + x^3 + x^2 + 1 (top-aligned)
pub const PREFERRED_PAIR_5_POLY_2: u32 = 0xE800_0000;

/// GPS C/A G1: x^10 + x^3 + 1 (top-aligned)
pub const PREFERRED_PAIR_10_POLY_1: u32 = 0x0240_0000;
/// GPS C/A G2: x^10 + x^9 + x^8 + x^6 + x^3 + x^2 + 1 (top-aligned)
pub const PREFERRED_PAIR_10_POLY_2: u32 = 0xD340_0000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldCode {
    first: SpreadingCode,
    second: SpreadingCode,
}

impl GoldCode {
    /// Create both registers; fails if either one is invalid
    pub fn new(degree: u32, poly_1: u32, poly_2: u32, state_1: u32, state_2: u32) -> Result<Self> {
        let first = SpreadingCode::new(degree, poly_1, state_1)?;
        let second = SpreadingCode::new(degree, poly_2, state_2)?;
        Ok(Self { first, second })
    }

    /// Degree-5 preferred pair with the given seeds (family period 31)
    pub fn preferred_pair_5(state_1: u32, state_2: u32) -> Result<Self> {
        Self::new(5, PREFERRED_PAIR_5_POLY_1, PREFERRED_PAIR_5_POLY_2, state_1, state_2)
    }

    /// Degree-10 preferred pair with the given seeds (family period 1023)
    pub fn preferred_pair_10(state_1: u32, state_2: u32) -> Result<Self> {
        Self::new(10, PREFERRED_PAIR_10_POLY_1, PREFERRED_PAIR_10_POLY_2, state_1, state_2)
    }

    /// Step both registers once and XOR their outputs
    pub fn next_bit(&mut self) -> u8 {
        self.first.next_bit() ^ self.second.next_bit()
    }

    /// Pull `n` bits from each register and XOR the packed bytes
    pub fn get_code(&mut self, n: usize) -> Result<Vec<u8>> {
        let first = self.first.get_bits(n)?;
        let second = self.second.get_bits(n)?;

        if first.len() != second.len() {
            return Err(AcquisitionError::LengthMismatch {
                expected: first.len(),
                actual: second.len(),
            });
        }

        Ok(first.iter().zip(second.iter()).map(|(a, b)| a ^ b).collect())
    }

    /// Reload both registers with their construction seeds
    pub fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }

    pub fn degree(&self) -> u32 {
        self.first.degree()
    }

    pub fn period(&self) -> u64 {
        self.first.period()
    }

    /// The two underlying registers
    pub fn registers(&self) -> (&SpreadingCode, &SpreadingCode) {
        (&self.first, &self.second)
    }
}
