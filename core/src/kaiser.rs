//! Kaiser-window FIR design
//!
//! Windowed-sinc synthesis of low-pass and band-pass `PassbandFilter`s from
//! ripple/rejection requirements. The filter length and window shape
//! (`alpha`) follow Kaiser's empirical formulas:
//!
//! - `A = -20·log10(min(δp, δs))`
//! - `alpha = 0` for `A < 21`, `0.5842·(A-21)^0.4 + 0.07886·(A-21)` for
//!   `21 ≤ A < 50`, `0.1102·(A-8.7)` above
//! - `taps = ceil(D·fs/Δf + 1)` forced odd, with `D = 0.922` for `A ≤ 21`
//!   and `(A-7.95)/14.36` otherwise
//!
//! Cutoffs sit at the middle of each transition band.

use crate::error::{AcquisitionError, Result};
use crate::filter::PassbandFilter;
use log::debug;
use std::f64::consts::PI;

/// Band edges of a Kaiser design, in Hz
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterBands {
    LowPass {
        passband: f64,
        stopband: f64,
    },
    BandPass {
        first_stopband: f64,
        first_passband: f64,
        second_passband: f64,
        second_stopband: f64,
    },
}

impl FilterBands {
    /// Narrowest transition band
    pub fn transition_width(&self) -> f64 {
        match *self {
            FilterBands::LowPass { passband, stopband } => stopband - passband,
            FilterBands::BandPass {
                first_stopband,
                first_passband,
                second_passband,
                second_stopband,
            } => (first_passband - first_stopband).min(second_stopband - second_passband),
        }
    }

    fn validate(&self, sampling_frequency: f64) -> Result<()> {
        let nyquist = sampling_frequency / 2.0;

        let ordered = match *self {
            FilterBands::LowPass { passband, stopband } => {
                0.0 < passband && passband < stopband && stopband < nyquist
            }
            FilterBands::BandPass {
                first_stopband,
                first_passband,
                second_passband,
                second_stopband,
            } => {
                0.0 < first_stopband
                    && first_stopband < first_passband
                    && first_passband < second_passband
                    && second_passband < second_stopband
                    && second_stopband < nyquist
            }
        };

        if ordered {
            Ok(())
        } else {
            Err(AcquisitionError::InvalidParameter(format!(
                "band edges {:?} must be increasing, positive and below Nyquist ({} Hz)",
                self, nyquist
            )))
        }
    }
}

/// Derived design quantities, exposed for inspection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KaiserParameters {
    /// Narrowest transition width, Hz
    pub delta_f: f64,
    /// Effective attenuation in dB
    pub attenuation: f64,
    pub alpha: f64,
    /// Normalized transition width `D`
    pub transition_width: f64,
    pub number_of_taps: usize,
}

/// Zeroth-order modified Bessel function of the first kind
///
/// Power series `Σ ((x/2)^k / k!)^2`, summed until terms stop contributing.
pub fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut sum = 1.0;
    let mut term = 1.0;
    let mut k = 1.0;

    loop {
        let ratio = half / k;
        term *= ratio * ratio;
        sum += term;
        if term <= sum * 1e-21 {
            break;
        }
        k += 1.0;
    }

    sum
}

/// Kaiser `alpha` for a given attenuation in dB
pub fn kaiser_alpha(attenuation: f64) -> f64 {
    if attenuation < 21.0 {
        0.0
    } else if attenuation < 50.0 {
        0.5842 * (attenuation - 21.0).powf(0.4) + 0.07886 * (attenuation - 21.0)
    } else {
        0.1102 * (attenuation - 8.7)
    }
}

/// Compute attenuation, alpha and tap count for a design
pub fn kaiser_parameters(
    bands: &FilterBands,
    passband_attenuation: f64,
    stopband_attenuation: f64,
    sampling_frequency: f64,
) -> Result<KaiserParameters> {
    if !(sampling_frequency > 0.0 && sampling_frequency.is_finite()) {
        return Err(AcquisitionError::InvalidParameter(format!(
            "sampling frequency {} must be > 0",
            sampling_frequency
        )));
    }

    if !(passband_attenuation > 0.0) || !(stopband_attenuation > 0.0) {
        return Err(AcquisitionError::InvalidParameter(format!(
            "attenuations must be > 0 dB (passband {}, stopband {})",
            passband_attenuation, stopband_attenuation
        )));
    }

    bands.validate(sampling_frequency)?;

    let delta_f = bands.transition_width();

    let ripple = 10f64.powf(passband_attenuation / 20.0);
    let delta_passband = (ripple - 1.0) / (ripple + 1.0);
    let delta_stopband = 10f64.powf(-stopband_attenuation / 20.0);
    let attenuation = -20.0 * delta_passband.min(delta_stopband).log10();

    let alpha = kaiser_alpha(attenuation);

    let transition_width = if attenuation <= 21.0 {
        0.922
    } else {
        (attenuation - 7.95) / 14.36
    };

    let mut number_of_taps = (transition_width * sampling_frequency / delta_f + 1.0).ceil() as usize;
    if number_of_taps % 2 == 0 {
        number_of_taps += 1;
    }

    Ok(KaiserParameters {
        delta_f,
        attenuation,
        alpha,
        transition_width,
        number_of_taps,
    })
}

/// Kaiser window weights for an odd tap count
pub fn kaiser_window(number_of_taps: usize, alpha: f64) -> Result<Vec<f64>> {
    if number_of_taps == 0 || number_of_taps % 2 == 0 {
        return Err(AcquisitionError::InvalidParameter(format!(
            "Kaiser window needs an odd tap count, got {}",
            number_of_taps
        )));
    }

    if number_of_taps == 1 {
        return Ok(vec![1.0]);
    }

    let m = ((number_of_taps - 1) / 2) as f64;
    let norm = bessel_i0(alpha);

    Ok((0..number_of_taps)
        .map(|i| {
            let i = i as f64;
            bessel_i0(alpha * (i * (2.0 * m - i)).sqrt() / m) / norm
        })
        .collect())
}

/// Design a filter meeting the given band edges and attenuations
pub fn design(
    bands: FilterBands,
    passband_attenuation: f64,
    stopband_attenuation: f64,
    sampling_frequency: f64,
) -> Result<PassbandFilter> {
    let params = kaiser_parameters(
        &bands,
        passband_attenuation,
        stopband_attenuation,
        sampling_frequency,
    )?;
    let taps = params.number_of_taps;
    let to_radians = |f: f64| 2.0 * PI * f / sampling_frequency;

    let mut filter = match bands {
        FilterBands::LowPass { passband, .. } => {
            PassbandFilter::lowpass_from_coefficients(passband, sampling_frequency, vec![0.0; taps])?
        }
        FilterBands::BandPass {
            first_passband,
            second_passband,
            ..
        } => PassbandFilter::new(first_passband, second_passband, sampling_frequency, taps)?,
    };

    let window = kaiser_window(taps, params.alpha)?;
    let center = (taps - 1) / 2;

    let ideal: Box<dyn Fn(usize) -> f64> = match bands {
        FilterBands::LowPass { passband, stopband } => {
            let wc = to_radians((passband + stopband) / 2.0);
            Box::new(move |i| {
                if i == center {
                    wc / PI
                } else {
                    let n = i as f64 - center as f64;
                    (wc * n).sin() / (PI * n)
                }
            })
        }
        FilterBands::BandPass {
            first_stopband,
            first_passband,
            second_passband,
            second_stopband,
        } => {
            let wa = to_radians((first_stopband + first_passband) / 2.0);
            let wb = to_radians((second_passband + second_stopband) / 2.0);
            Box::new(move |i| {
                if i == center {
                    (wb - wa) / PI
                } else {
                    let n = i as f64 - center as f64;
                    ((wb * n).sin() - (wa * n).sin()) / (PI * n)
                }
            })
        }
    };

    for (i, (c, w)) in filter.coefficients_mut().iter_mut().zip(window.iter()).enumerate() {
        *c = w * ideal(i);
    }

    debug!(
        "Kaiser design {:?}: A={:.2} dB, alpha={:.4}, taps={}",
        bands, params.attenuation, params.alpha, taps
    );

    Ok(filter)
}

/// Low-pass design with one transition band
pub fn lowpass(
    passband: f64,
    stopband: f64,
    passband_attenuation: f64,
    stopband_attenuation: f64,
    sampling_frequency: f64,
) -> Result<PassbandFilter> {
    design(
        FilterBands::LowPass { passband, stopband },
        passband_attenuation,
        stopband_attenuation,
        sampling_frequency,
    )
}

/// Band-pass design with two transition bands
pub fn bandpass(
    first_stopband: f64,
    first_passband: f64,
    second_passband: f64,
    second_stopband: f64,
    passband_attenuation: f64,
    stopband_attenuation: f64,
    sampling_frequency: f64,
) -> Result<PassbandFilter> {
    design(
        FilterBands::BandPass {
            first_stopband,
            first_passband,
            second_passband,
            second_stopband,
        },
        passband_attenuation,
        stopband_attenuation,
        sampling_frequency,
    )
}
