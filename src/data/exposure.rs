//! Exposure-map reduction: from a 2-D exposure map to per-channel exposure,
//! the good-channel set, and the per-CCD channel index ranges.
//!
//! Chip gaps and bad columns show up as runs of zero exposure between the
//! first and last usable channel; the 9 CCD spans are the stretches between
//! consecutive gap runs.

use crate::data::channels::{GoodChannelSet, Instrument};

/// Thresholds used when reducing an exposure map.
#[derive(Debug, Clone, Copy)]
pub struct ExposureConfig {
    /// A channel is usable when its exposure exceeds this fraction of the
    /// map maximum.
    pub good_fraction: f64,
    /// The first/last channel of the used span must exceed this fraction.
    pub edge_fraction: f64,
    /// Channels between `good_fraction` and this fraction of the maximum
    /// are "low exposure": kept, but rescaled to full exposure.
    pub low_fraction_hi: f64,
    /// Calibration shim: a fixed CCD span inserted as the third entry of
    /// the derived CCD table. Known to be needed for RGS1 (650, 965);
    /// not applicable to RGS2.
    pub forced_ccd_span: Option<(usize, usize)>,
}

impl ExposureConfig {
    /// Default thresholds for the given instrument.
    pub fn for_instrument(instrument: Instrument) -> Self {
        Self {
            good_fraction: 0.85,
            edge_fraction: 0.5,
            low_fraction_hi: 0.99,
            forced_ccd_span: match instrument {
                Instrument::Rgs1 => Some((650, 965)),
                Instrument::Rgs2 => None,
            },
        }
    }
}

/// Per-channel exposure collapsed from the map, with the usable span located.
#[derive(Debug, Clone)]
pub struct ExposureProfile {
    exposure: Vec<f64>,
    max_exposure: f64,
    /// First channel whose exposure exceeds `edge_fraction` of the maximum.
    pub first_channel: usize,
    /// Last channel whose exposure exceeds `edge_fraction` of the maximum.
    pub last_channel: usize,
}

impl ExposureProfile {
    /// Collapse a 2-D exposure map (rows of equal length, one value per
    /// cross-dispersion bin and channel) by taking the per-channel maximum.
    pub fn from_map(rows: &[Vec<f64>], config: &ExposureConfig) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut exposure = vec![0.0f64; width];
        for row in rows {
            for (i, &v) in row.iter().enumerate() {
                if v > exposure[i] {
                    exposure[i] = v;
                }
            }
        }
        Self::from_channels(exposure, config)
    }

    /// Build a profile from an already-collapsed per-channel exposure array.
    pub fn from_channels(exposure: Vec<f64>, config: &ExposureConfig) -> Self {
        let max_exposure = exposure.iter().cloned().fold(0.0f64, f64::max);
        let edge = max_exposure * config.edge_fraction;

        let first_channel = exposure
            .iter()
            .position(|&e| e != 0.0 && e > edge)
            .unwrap_or(0);
        let last_channel = exposure
            .iter()
            .rposition(|&e| e != 0.0 && e > edge)
            .unwrap_or(0);

        Self {
            exposure,
            max_exposure,
            first_channel,
            last_channel,
        }
    }

    pub fn exposure(&self) -> &[f64] {
        &self.exposure
    }

    pub fn max_exposure(&self) -> f64 {
        self.max_exposure
    }

    /// Channels with enough exposure to be scientifically usable.
    pub fn good_channels(&self, config: &ExposureConfig) -> GoodChannelSet {
        let cut = self.max_exposure * config.good_fraction;
        GoodChannelSet::new(
            self.exposure
                .iter()
                .enumerate()
                .filter(|(_, &e)| e > cut)
                .map(|(i, _)| i)
                .collect(),
        )
    }

    /// Channels inside the usable span with exactly zero exposure
    /// (chip gaps and dead columns).
    pub fn gap_channels(&self) -> Vec<usize> {
        (self.first_channel..self.last_channel)
            .filter(|&i| self.exposure[i] == 0.0)
            .collect()
    }

    /// Channels in the low-exposure band (between `good_fraction` and
    /// `low_fraction_hi` of the maximum).
    pub fn low_exposure_channels(&self, config: &ExposureConfig) -> Vec<usize> {
        let lo = self.max_exposure * config.good_fraction;
        let hi = self.max_exposure * config.low_fraction_hi;
        self.exposure
            .iter()
            .enumerate()
            .filter(|(_, &e)| e > lo && e <= hi)
            .map(|(i, _)| i)
            .collect()
    }

    /// Rescale background counts of low-exposure channels to full exposure
    /// and patch their exposure from the larger neighbor, in place.
    /// Returns the indices that were touched.
    pub fn rescale_low_exposure(
        &mut self,
        background_counts: &mut [f64],
        config: &ExposureConfig,
    ) -> Vec<usize> {
        let low = self.low_exposure_channels(config);
        for &i in &low {
            if self.exposure[i] > 0.0 && i < background_counts.len() {
                background_counts[i] *= self.max_exposure / self.exposure[i];
            }
        }
        for &i in &low {
            let left = if i > 0 { self.exposure[i - 1] } else { 0.0 };
            let right = if i + 1 < self.exposure.len() {
                self.exposure[i + 1]
            } else {
                0.0
            };
            self.exposure[i] = left.max(right).max(self.exposure[i]);
        }
        low
    }

    /// Derive the per-CCD channel index ranges from the gap runs.
    ///
    /// Each span stretches from the end of one zero-exposure run to the
    /// start of the next; the first and last spans are anchored at the
    /// edges of the usable channel range. A configured `forced_ccd_span`
    /// is inserted as the third entry (RGS1 calibration).
    pub fn ccd_channel_ranges(&self, config: &ExposureConfig) -> Vec<(usize, usize)> {
        let gaps = self.gap_channels();
        if gaps.is_empty() {
            return vec![(self.first_channel, self.last_channel)];
        }

        let mut spans: Vec<(usize, usize)> = vec![(self.first_channel, gaps[0])];

        // Positions where consecutive gap channels are not adjacent mark
        // the end of one gap run and the start of the next CCD.
        for w in gaps.windows(2) {
            if w[1] != w[0] + 1 {
                spans.push((w[0], w[1]));
            }
        }
        spans.push((gaps[gaps.len() - 1], self.last_channel));

        if let Some(forced) = config.forced_ccd_span {
            let at = 2.min(spans.len());
            spans.insert(at, forced);
        }
        spans
    }
}
