//! One-sided real FFT helpers on top of rustfft.
//!
//! `rfft`/`irfft` follow the usual numerical-library conventions: the
//! forward transform is unnormalized and returns the n/2 + 1 non-redundant
//! bins of a real signal; the inverse rebuilds the redundant half by
//! Hermitian symmetry and divides by n, so `irfft(rfft(x, n), n) == x`.

use num_complex::Complex;
use rustfft::FftPlanner;

/// Next power of two >= n.
pub fn next_power_of_two(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p <<= 1;
    }
    p
}

/// Forward one-sided transform of a real signal.
///
/// The signal is zero-padded (or truncated) to `n`, which must be even.
/// Returns `n / 2 + 1` complex bins.
pub fn rfft(signal: &[f64], n: usize) -> Vec<Complex<f64>> {
    debug_assert!(n % 2 == 0, "one-sided FFT size must be even");
    let mut buffer: Vec<Complex<f64>> = signal
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(n)
        .collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    buffer.truncate(n / 2 + 1);
    buffer
}

/// Inverse of [`rfft`]: recover the length-`n` real signal from its
/// one-sided spectrum. `bins.len()` must equal `n / 2 + 1`.
pub fn irfft(bins: &[Complex<f64>], n: usize) -> Vec<f64> {
    debug_assert_eq!(bins.len(), n / 2 + 1, "one-sided spectrum length");
    let mut buffer: Vec<Complex<f64>> = Vec::with_capacity(n);
    buffer.extend_from_slice(bins);
    // Upper half from Hermitian symmetry: X[n-k] = conj(X[k])
    for k in (1..n / 2).rev() {
        buffer.push(bins[k].conj());
    }

    let mut planner = FftPlanner::new();
    let inv = planner.plan_fft_inverse(n);
    inv.process(&mut buffer);

    let norm = 1.0 / n as f64;
    buffer.iter().map(|c| c.re * norm).collect()
}

/// Power per frequency bin: squared real plus squared imaginary part.
pub fn power_spectrum(bins: &[Complex<f64>]) -> Vec<f64> {
    bins.iter().map(|c| c.re * c.re + c.im * c.im).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_next_power_of_two() {
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(512), 512);
        assert_eq!(next_power_of_two(513), 1024);
    }

    #[test]
    fn test_rfft_dc() {
        let bins = rfft(&[1.0; 8], 8);
        assert_eq!(bins.len(), 5);
        assert!((bins[0].re - 8.0).abs() < 1e-12);
        for b in &bins[1..] {
            assert!(b.norm() < 1e-12);
        }
    }

    #[test]
    fn test_rfft_single_tone() {
        let n = 64;
        let k = 5;
        let signal: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * k as f64 * i as f64 / n as f64).cos())
            .collect();
        let power = power_spectrum(&rfft(&signal, n));
        let peak = power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert_eq!(peak, k);
    }

    #[test]
    fn test_round_trip_identity() {
        let n = 128;
        let signal: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin() + 0.25).collect();
        let back = irfft(&rfft(&signal, n), n);
        assert_eq!(back.len(), n);
        for (a, b) in signal.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-10, "{a} vs {b}");
        }
    }

    #[test]
    fn test_round_trip_with_padding() {
        let n = 32;
        let signal = vec![3.5; 10];
        let back = irfft(&rfft(&signal, n), n);
        for (i, v) in back.iter().enumerate() {
            let expected = if i < 10 { 3.5 } else { 0.0 };
            assert!((v - expected).abs() < 1e-10);
        }
    }
}
