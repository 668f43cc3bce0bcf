//! Rate recomputation after smoothing: net source rate, its Poisson error,
//! and the background rate, plus the scatter back onto the full detector
//! channel grid for downstream spectral files.

use serde::{Deserialize, Serialize};

use crate::data::channels::{ChannelGrid, GoodChannelSet};

/// Number of spectral channels of the full (unfiltered) RGS grid.
pub const RGS_DETECTOR_CHANNELS: usize = 3600;

/// Count rates recomputed from the smoothed background, one entry per
/// channel of the good-filtered grid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateSpectra {
    /// Background-subtracted source rate: (src - smoothed_bkg) / exposure.
    pub net_rate: Vec<f64>,
    /// Poisson error on the source rate: sqrt(src) / exposure.
    pub net_rate_err: Vec<f64>,
    /// Smoothed background rate: smoothed_bkg / exposure.
    pub bkg_rate: Vec<f64>,
    /// Smoothed background in counts.
    pub bkg_counts: Vec<f64>,
}

/// Recompute rates from the smoothed background array.
///
/// `smoothed` must be indexed like `grid`. Channels with zero exposure
/// produce zero rates.
pub fn recompute_rates(grid: &ChannelGrid, smoothed: &[f64]) -> RateSpectra {
    let n = grid.len().min(smoothed.len());
    let mut rates = RateSpectra {
        net_rate: Vec::with_capacity(n),
        net_rate_err: Vec::with_capacity(n),
        bkg_rate: Vec::with_capacity(n),
        bkg_counts: Vec::with_capacity(n),
    };
    for i in 0..n {
        let c = grid.channel(i);
        let fs = smoothed[i];
        if c.exposure > 0.0 {
            rates.net_rate.push((c.source_counts - fs) / c.exposure);
            rates
                .net_rate_err
                .push(c.source_counts.max(0.0).sqrt() / c.exposure);
            rates.bkg_rate.push(fs / c.exposure);
        } else {
            rates.net_rate.push(0.0);
            rates.net_rate_err.push(0.0);
            rates.bkg_rate.push(0.0);
        }
        rates.bkg_counts.push(fs);
    }
    rates
}

/// Scatter good-channel-indexed values onto the full detector grid.
///
/// `values[j]` lands at detector channel `good.indices()[j]`; every other
/// channel stays zero.
pub fn scatter_to_detector_grid(
    values: &[f64],
    good: &GoodChannelSet,
    detector_channels: usize,
) -> Vec<f64> {
    let mut out = vec![0.0; detector_channels];
    for (j, &idx) in good.indices().iter().enumerate() {
        if j >= values.len() {
            break;
        }
        if idx < detector_channels {
            out[idx] = values[j];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::channels::Channel;

    fn grid() -> ChannelGrid {
        ChannelGrid::new(vec![
            Channel {
                wav_lo: 10.0,
                wav_hi: 10.1,
                exposure: 1000.0,
                source_counts: 400.0,
                background_counts: 120.0,
            },
            Channel {
                wav_lo: 10.1,
                wav_hi: 10.2,
                exposure: 0.0,
                source_counts: 9.0,
                background_counts: 3.0,
            },
        ])
    }

    #[test]
    fn test_rates_from_smoothed_background() {
        let rates = recompute_rates(&grid(), &[100.0, 2.0]);
        assert!((rates.net_rate[0] - (400.0 - 100.0) / 1000.0).abs() < 1e-12);
        assert!((rates.net_rate_err[0] - 20.0 / 1000.0).abs() < 1e-12);
        assert!((rates.bkg_rate[0] - 0.1).abs() < 1e-12);
        assert_eq!(rates.bkg_counts, vec![100.0, 2.0]);
    }

    #[test]
    fn test_zero_exposure_gives_zero_rates() {
        let rates = recompute_rates(&grid(), &[100.0, 2.0]);
        assert_eq!(rates.net_rate[1], 0.0);
        assert_eq!(rates.net_rate_err[1], 0.0);
        assert_eq!(rates.bkg_rate[1], 0.0);
    }

    #[test]
    fn test_scatter_to_detector_grid() {
        let good = GoodChannelSet::new(vec![2, 5, 7]);
        let out = scatter_to_detector_grid(&[1.0, 2.0, 3.0], &good, 10);
        assert_eq!(out, vec![0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_scatter_ignores_out_of_range() {
        let good = GoodChannelSet::new(vec![1, 99]);
        let out = scatter_to_detector_grid(&[5.0, 6.0], &good, 4);
        assert_eq!(out, vec![0.0, 5.0, 0.0, 0.0]);
    }
}
