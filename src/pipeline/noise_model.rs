//! Per-segment noise model: power spectrum of the mean-subtracted
//! background trace plus a bounded fit of `power(x) = C + N·x^a`.
//!
//! The floor C is pinned to the average power of the high-frequency band
//! (pure measurement noise); the two free parameters are fit against the
//! structured low-frequency band, where the power law rises above the
//! floor. A diverging or out-of-range fit degrades to the flat model
//! (N = 0, a = -1), which turns the downstream filter into "replace the
//! segment by its mean".

use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::pipeline::fit::{fit_power_law, FitBounds, FitOutcome};
use crate::pipeline::spectrum::{next_power_of_two, power_spectrum, rfft};

/// Frequency-bin bands of the power spectrum used by the fit.
///
/// The defaults (bins [1, 30) structured, [30, 512) noise) are tied to the
/// RGS channel count; other instruments should override them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BandSplit {
    /// Half-open bin range carrying genuine low-frequency structure.
    pub structured: (usize, usize),
    /// Half-open bin range treated as pure measurement noise.
    pub noise: (usize, usize),
}

impl Default for BandSplit {
    fn default() -> Self {
        Self {
            structured: (1, 30),
            noise: (30, 512),
        }
    }
}

/// Exponent window outside which a nominally converged fit is considered
/// numerically divergent and replaced by the flat model.
const EXPONENT_GUARD: (f64, f64) = (-5.0, -0.1);
/// Amplitudes below this are indistinguishable from zero and snapped to it.
const AMPLITUDE_SNAP: f64 = 1e-4;

/// Fitted power-law-plus-floor noise model of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseModel {
    /// Floor C: average high-band power.
    pub floor: f64,
    /// Power-law amplitude N. Either exactly 0 or >= 1e-4.
    pub amplitude: f64,
    /// Power-law exponent a, within [-3, -0.1].
    pub exponent: f64,
    /// False when the flat fallback was substituted.
    pub converged: bool,
}

impl NoiseModel {
    /// The non-informative fallback: no structured content above the floor.
    pub fn flat(floor: f64) -> Self {
        Self {
            floor,
            amplitude: 0.0,
            exponent: -1.0,
            converged: false,
        }
    }
}

/// One segment's spectrum and fitted model, everything the reconstructor
/// needs to rebuild the smoothed trace.
#[derive(Debug, Clone)]
pub struct FittedSegment {
    pub model: NoiseModel,
    /// One-sided FFT coefficients of the padded, mean-subtracted trace.
    pub bins: Vec<Complex<f64>>,
    /// Padded transform length (power of two, >= 2x the member count).
    pub fft_size: usize,
    /// Arithmetic mean subtracted before the transform.
    pub mean: f64,
    /// Number of member channels that entered the transform.
    pub member_count: usize,
}

/// Compute the segment's power spectrum and fit the noise model.
///
/// `values` are the background counts of the segment's member channels and
/// must be non-empty (empty segments are skipped upstream).
pub fn fit_segment(values: &[f64], bands: &BandSplit, bounds: &FitBounds) -> FittedSegment {
    let nj = values.len();
    let fft_size = next_power_of_two(2 * nj);
    let mean = values.iter().sum::<f64>() / nj as f64;

    // Pad with the mean to avoid an edge discontinuity, then subtract it
    // from the whole buffer (the padding becomes exactly zero).
    let mut buffer = Vec::with_capacity(fft_size);
    buffer.extend_from_slice(values);
    buffer.resize(fft_size, mean);
    for v in &mut buffer {
        *v -= mean;
    }

    let bins = rfft(&buffer, fft_size);
    let power = power_spectrum(&bins);

    // Floor: average observed power over the noise band.
    let noise_lo = bands.noise.0.min(power.len());
    let noise_hi = bands.noise.1.min(power.len());
    let floor = if noise_hi > noise_lo {
        power[noise_lo..noise_hi].iter().sum::<f64>() / (noise_hi - noise_lo) as f64
    } else {
        0.0
    };

    // Structured band, fit abscissa is the bin index offset by one.
    let struct_lo = bands.structured.0.min(power.len());
    let struct_hi = bands.structured.1.min(power.len());
    let x: Vec<f64> = (struct_lo..struct_hi).map(|k| (k + 1) as f64).collect();
    let y: Vec<f64> = power[struct_lo..struct_hi].to_vec();

    let model = match fit_power_law(&x, &y, floor, bounds) {
        FitOutcome::Converged {
            amplitude,
            exponent,
        } => {
            if exponent < EXPONENT_GUARD.0 || exponent > EXPONENT_GUARD.1 {
                log::warn!(
                    "noise fit ran away (a = {exponent:.3}), substituting flat model"
                );
                NoiseModel::flat(floor)
            } else {
                let amplitude = if amplitude.abs() < AMPLITUDE_SNAP {
                    0.0
                } else {
                    amplitude
                };
                NoiseModel {
                    floor,
                    amplitude,
                    exponent,
                    converged: true,
                }
            }
        }
        FitOutcome::Diverged => {
            log::warn!("noise fit did not converge, substituting flat model");
            NoiseModel::flat(floor)
        }
    };

    FittedSegment {
        model,
        bins,
        fft_size,
        mean,
        member_count: nj,
    }
}
