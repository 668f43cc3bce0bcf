//! Frequency-domain attenuation filter and inverse transform.
//!
//! Each bin keeps the fraction of its power the fitted model attributes to
//! structured (power-law) content: phi = N·x^a / (C + N·x^a). At low
//! frequencies the power law dominates and phi -> 1; at high frequencies
//! the floor dominates and phi -> 0, giving an adaptive low-pass with no
//! fixed cutoff. A flat model (N = 0) collapses the segment to its mean.

use crate::pipeline::noise_model::{FittedSegment, NoiseModel};
use crate::pipeline::spectrum::irfft;

/// Attenuation fraction for the 0-based frequency bin.
///
/// Evaluated at the 1-based abscissa x = bin + 1, like the fit. A modeled
/// total of zero is a degenerate flat-zero model; its bins are fully
/// suppressed.
pub fn attenuation(model: &NoiseModel, bin: usize) -> f64 {
    let x = (bin + 1) as f64;
    let excess = model.amplitude * x.powf(model.exponent);
    let total = model.floor + excess;
    if total == 0.0 {
        0.0
    } else {
        excess / total
    }
}

/// Apply the attenuation filter and invert the transform.
///
/// Returns the smoothed padded trace (length `fft_size`) with the segment
/// mean re-added; the caller writes the leading `member_count` values back
/// into the global grid.
pub fn reconstruct(fitted: &FittedSegment) -> Vec<f64> {
    let filtered: Vec<_> = fitted
        .bins
        .iter()
        .enumerate()
        .map(|(i, b)| *b * attenuation(&fitted.model, i))
        .collect();

    let mut trace = irfft(&filtered, fitted.fft_size);
    for v in &mut trace {
        *v += fitted.mean;
    }
    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fit::FitBounds;
    use crate::pipeline::noise_model::{fit_segment, BandSplit, NoiseModel};
    use crate::pipeline::spectrum::rfft;
    use num_complex::Complex;

    #[test]
    fn test_attenuation_limits() {
        let model = NoiseModel {
            floor: 10.0,
            amplitude: 1e6,
            exponent: -2.0,
            converged: true,
        };
        // Power law dominates at bin 0 (x = 1), floor dominates far out.
        assert!(attenuation(&model, 0) > 0.99);
        assert!(attenuation(&model, 10_000) < 0.01);
        // Monotonically falling for a negative exponent.
        let a = attenuation(&model, 3);
        let b = attenuation(&model, 30);
        assert!(a > b);
    }

    #[test]
    fn test_degenerate_model_suppresses_everything() {
        let model = NoiseModel::flat(0.0);
        for bin in 0..16 {
            assert_eq!(attenuation(&model, bin), 0.0);
        }
    }

    #[test]
    fn test_flat_model_reproduces_mean() {
        let values: Vec<f64> = (0..100).map(|i| 50.0 + (i as f64 * 0.9).sin()).collect();
        let mut fitted = fit_segment(&values, &BandSplit::default(), &FitBounds::default());
        fitted.model = NoiseModel::flat(fitted.model.floor);
        let trace = reconstruct(&fitted);
        for v in &trace[..fitted.member_count] {
            assert!((v - fitted.mean).abs() < 1e-9);
        }
    }

    /// Forcing C = 0 makes phi exactly 1 everywhere, so the filter must be
    /// the identity: the inverse transform returns the padded
    /// mean-subtracted input to floating-point precision.
    #[test]
    fn test_unit_filter_round_trip() {
        let values: Vec<f64> = (0..200)
            .map(|i| 100.0 + 7.0 * (i as f64 * 0.05).sin() + (i as f64 * 1.3).cos())
            .collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let centered: Vec<f64> = values.iter().map(|v| v - mean).collect();

        let fitted = FittedSegment {
            model: NoiseModel {
                floor: 0.0,
                amplitude: 1.0,
                exponent: -0.5,
                converged: true,
            },
            bins: rfft(&centered, 512),
            fft_size: 512,
            mean,
            member_count: values.len(),
        };
        let trace = reconstruct(&fitted);
        for (orig, rec) in values.iter().zip(&trace) {
            assert!((orig - rec).abs() < 1e-9, "{orig} vs {rec}");
        }
        // Padding region: mean-subtracted zeros plus the mean.
        for v in &trace[values.len()..] {
            assert!((v - mean).abs() < 1e-9);
        }
    }

    #[test]
    fn test_filter_scales_both_parts() {
        let model = NoiseModel {
            floor: 5.0,
            amplitude: 20.0,
            exponent: -1.0,
            converged: true,
        };
        let phi = attenuation(&model, 2);
        let b = Complex::new(3.0, -4.0);
        let scaled = b * phi;
        assert!((scaled.re - 3.0 * phi).abs() < 1e-12);
        assert!((scaled.im + 4.0 * phi).abs() < 1e-12);
    }
}
