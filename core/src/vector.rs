//! Elementary vector arithmetic shared by the despread pipeline
//!
//! Small, allocation-aware helpers: elementwise product, scaled sum and
//! sum-of-squares energy. The `_into` variants write into a caller-owned
//! buffer so hot loops can reuse scratch space.

use crate::error::{AcquisitionError, Result};

/// Elementwise product of two equal-length signals
pub fn multiply(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    let mut out = Vec::with_capacity(a.len());
    multiply_into(a, b, &mut out)?;
    Ok(out)
}

/// Elementwise product written into `out` (cleared first)
pub fn multiply_into(a: &[f64], b: &[f64], out: &mut Vec<f64>) -> Result<()> {
    if a.len() != b.len() {
        return Err(AcquisitionError::LengthMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    out.clear();
    out.extend(a.iter().zip(b.iter()).map(|(x, y)| x * y));
    Ok(())
}

/// Square every sample in place
pub fn square_in_place(a: &mut [f64]) {
    for x in a.iter_mut() {
        *x *= *x;
    }
}

/// Sum of all samples multiplied by `scale`
pub fn sum(a: &[f64], scale: f64) -> f64 {
    a.iter().map(|x| x * scale).sum()
}

/// Sum of squares
pub fn energy(a: &[f64]) -> f64 {
    a.iter().map(|x| x * x).sum()
}
