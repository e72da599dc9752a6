use crate::error::{AcquisitionError, Result};

/// Smallest supported register width
pub const MIN_DEGREE: u32 = 2;

/// Largest supported register width (one full 32-bit word)
pub const MAX_DEGREE: u32 = 32;

/// Mask covering the top `degree` bits of a 32-bit register
///
/// The register is top-aligned: stage 1 (newest bit) sits at bit 31 and
/// stage `degree` (the output stage) at bit `32 - degree`.
pub fn top_degree_mask(degree: u32) -> u32 {
    !0u32 << (32 - degree)
}

/// Linear-feedback shift register producing an m-sequence
///
/// `generator_polynomial` is top-aligned like the register: a set bit at
/// position `32 - degree + e` is the polynomial term `x^e` (the leading
/// `x^degree` term is implicit). The output stage tap (`x^0`) must be set.
///
/// A primitive polynomial and a nonzero seed give a sequence of period
/// `2^degree - 1`. A zero seed yields zeros forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadingCode {
    degree: u32,
    generator_polynomial: u32,
    state: u32,
    seed: u32,
}

impl SpreadingCode {
    /// Create a register of `degree` stages loaded with `initial_state`
    ///
    /// Bits of `initial_state` below the register are not part of it and
    /// are dropped.
    pub fn new(degree: u32, generator_polynomial: u32, initial_state: u32) -> Result<Self> {
        if !(MIN_DEGREE..=MAX_DEGREE).contains(&degree) {
            return Err(AcquisitionError::InvalidParameter(format!(
                "degree {} outside {}..={}",
                degree, MIN_DEGREE, MAX_DEGREE
            )));
        }

        let mask = top_degree_mask(degree);
        let output_tap = 1u32 << (32 - degree);

        if generator_polynomial & output_tap == 0 {
            return Err(AcquisitionError::InvalidParameter(format!(
                "generator polynomial {:#010x} has no x^0 tap (bit {})",
                generator_polynomial,
                32 - degree
            )));
        }

        if generator_polynomial & !mask != 0 {
            return Err(AcquisitionError::InvalidParameter(format!(
                "generator polynomial {:#010x} has bits outside the top {} bits",
                generator_polynomial, degree
            )));
        }

        let seed = initial_state & mask;
        Ok(Self {
            degree,
            generator_polynomial,
            state: seed,
            seed,
        })
    }

    /// Emit the output stage and shift the feedback bit into stage 1
    pub fn next_bit(&mut self) -> u8 {
        let mask = top_degree_mask(self.degree);
        let feedback = (self.state & self.generator_polynomial & mask).count_ones() & 1;
        let output = (self.state >> (32 - self.degree)) & 1;

        self.state = (self.state >> 1) & mask;
        if feedback == 1 {
            self.state |= 1 << 31;
        }

        output as u8
    }

    /// Pull `n` bits packed MSB-first; returns `ceil(n / 8)` bytes
    ///
    /// Unused trailing bits of the last byte are zero.
    pub fn get_bits(&mut self, n: usize) -> Result<Vec<u8>> {
        if n == 0 {
            return Err(AcquisitionError::InvalidParameter(
                "bit count must be > 0".to_string(),
            ));
        }

        let mut bytes = vec![0u8; n.div_ceil(8)];
        for i in 0..n {
            if self.next_bit() == 1 {
                bytes[i / 8] |= 0x80 >> (i % 8);
            }
        }

        Ok(bytes)
    }

    /// Reload the register with its construction seed
    pub fn reset(&mut self) {
        self.state = self.seed;
    }

    pub fn degree(&self) -> u32 {
        self.degree
    }

    pub fn generator_polynomial(&self) -> u32 {
        self.generator_polynomial
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Sequence period for a primitive polynomial: `2^degree - 1`
    pub fn period(&self) -> u64 {
        (1u64 << self.degree) - 1
    }
}

/// Endless stream of output bits
impl Iterator for SpreadingCode {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        Some(self.next_bit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Build a top-aligned polynomial from its exponents (excluding x^degree)
    fn top_aligned(degree: u32, exponents: &[u32]) -> u32 {
        exponents
            .iter()
            .fold(0u32, |acc, &e| acc | (1u32 << (32 - degree + e)))
    }

    fn assert_maximal_length(degree: u32, exponents: &[u32]) {
        let poly = top_aligned(degree, exponents);
        let mut code = SpreadingCode::new(degree, poly, !0).unwrap();
        let seed = code.state();
        let period = code.period();

        let mut seen = HashSet::new();
        for _ in 0..period {
            assert!(seen.insert(code.state()), "state repeated early (degree {})", degree);
            code.next_bit();
        }

        assert_eq!(seen.len() as u64, period);
        assert!(!seen.contains(&0));
        assert_eq!(code.state(), seed, "degree {} did not return to seed", degree);
    }

    #[test]
    fn test_top_degree_mask() {
        assert_eq!(top_degree_mask(2), 0xC000_0000);
        assert_eq!(top_degree_mask(5), 0xF800_0000);
        assert_eq!(top_degree_mask(32), 0xFFFF_FFFF);
    }

    #[test]
    fn test_known_polynomial_encodings() {
        assert_eq!(top_aligned(5, &[2, 0]), 0x2800_0000);
        assert_eq!(top_aligned(10, &[3, 0]), 0x0240_0000);
    }

    #[test]
    fn test_maximal_length_small_degrees() {
        assert_maximal_length(2, &[1, 0]);
        assert_maximal_length(3, &[1, 0]);
        assert_maximal_length(4, &[1, 0]);
        assert_maximal_length(5, &[2, 0]);
        assert_maximal_length(7, &[1, 0]);
    }

    #[test]
    fn test_maximal_length_larger_degrees() {
        assert_maximal_length(10, &[3, 0]);
        assert_maximal_length(16, &[14, 13, 11, 0]);
    }

    #[test]
    fn test_degree_5_first_bits() {
        let mut code = SpreadingCode::new(5, 0x2800_0000, 0xF800_0000).unwrap();
        let bits: Vec<u8> = (0..16).map(|_| code.next_bit()).collect();
        assert_eq!(bits, vec![1, 1, 1, 1, 1, 0, 0, 0, 1, 1, 0, 1, 1, 1, 0, 1]);
    }

    #[test]
    fn test_degree_32_accepted() {
        // x^32 + x^22 + x^2 + x + 1
        let poly = top_aligned(32, &[22, 2, 1, 0]);
        let mut code = SpreadingCode::new(32, poly, 0xDEAD_BEEF).unwrap();
        let bytes = code.get_bits(64).unwrap();
        assert_eq!(bytes.len(), 8);
        assert!(bytes.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_zero_seed_stays_zero() {
        let mut code = SpreadingCode::new(5, 0x2800_0000, 0).unwrap();
        assert!((0..100).all(|_| code.next_bit() == 0));
        assert_eq!(code.state(), 0);
    }

    #[test]
    fn test_invalid_degree() {
        assert!(matches!(
            SpreadingCode::new(1, 0x8000_0000, 1),
            Err(AcquisitionError::InvalidParameter(_))
        ));
        assert!(matches!(
            SpreadingCode::new(33, 1, 1),
            Err(AcquisitionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_polynomial_without_output_tap() {
        // x^5 + x^2 without the +1 term
        let result = SpreadingCode::new(5, 0x2000_0000, 0xF800_0000);
        assert!(matches!(result, Err(AcquisitionError::InvalidParameter(_))));
    }

    #[test]
    fn test_polynomial_bits_outside_register() {
        let result = SpreadingCode::new(5, 0x2800_0001, 0xF800_0000);
        assert!(matches!(result, Err(AcquisitionError::InvalidParameter(_))));
    }

    #[test]
    fn test_seed_is_masked() {
        let code = SpreadingCode::new(5, 0x2800_0000, 0xFFFF_FFFF).unwrap();
        assert_eq!(code.seed(), 0xF800_0000);
    }

    #[test]
    fn test_get_bits_zero_is_error() {
        let mut code = SpreadingCode::new(5, 0x2800_0000, 0xF800_0000).unwrap();
        assert!(matches!(
            code.get_bits(0),
            Err(AcquisitionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_get_bits_packing_msb_first() {
        let mut code = SpreadingCode::new(5, 0x2800_0000, 0xF800_0000).unwrap();
        let bytes = code.get_bits(12).unwrap();
        // 1111 1000 | 1101 (0000)
        assert_eq!(bytes, vec![0xF8, 0xD0]);
    }

    #[test]
    fn test_get_bits_split_matches_single_call() {
        let poly = top_aligned(10, &[3, 0]);
        let mut split = SpreadingCode::new(10, poly, 0x1234_5678).unwrap();
        let mut whole = split.clone();

        let unpack = |bytes: &[u8], n: usize| -> Vec<u8> {
            (0..n).map(|i| (bytes[i / 8] >> (7 - i % 8)) & 1).collect()
        };

        let first = unpack(&split.get_bits(13).unwrap(), 13);
        let second = unpack(&split.get_bits(27).unwrap(), 27);
        let all = unpack(&whole.get_bits(40).unwrap(), 40);

        assert_eq!([first, second].concat(), all);
    }

    #[test]
    fn test_iterator_matches_next_bit() {
        let mut a = SpreadingCode::new(5, 0x2800_0000, 0xF800_0000).unwrap();
        let mut b = a.clone();
        let from_iter: Vec<u8> = a.by_ref().take(31).collect();
        let from_calls: Vec<u8> = (0..31).map(|_| b.next_bit()).collect();
        assert_eq!(from_iter, from_calls);
    }

    #[test]
    fn test_get_bits_advances_state() {
        let mut code = SpreadingCode::new(5, 0x2800_0000, 0xF800_0000).unwrap();
        let a = code.get_bits(8).unwrap();
        let b = code.get_bits(8).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_reset_restores_sequence() {
        let mut code = SpreadingCode::new(5, 0x2800_0000, 0xA800_0000).unwrap();
        let before = code.get_bits(40).unwrap();
        code.reset();
        assert_eq!(code.state(), 0xA800_0000);
        assert_eq!(code.get_bits(40).unwrap(), before);
    }
}
