//! In-memory channel grid for one RGS observation.
//!
//! The grid is produced by an external data-preparation step (exposure map
//! plus source/background spectra, see [`crate::data::exposure`]) and is
//! already restricted to good-exposure channels. This core never touches
//! FITS files; it only consumes and produces numeric arrays.

use serde::{Deserialize, Serialize};

use crate::error::SmoothError;

/// keV·Å conversion constant (hc) used to move between energy and wavelength.
pub const HC_KEV_ANGSTROM: f64 = 12.398424;

/// The two RGS detector units aboard XMM-Newton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instrument {
    Rgs1,
    Rgs2,
}

impl Instrument {
    /// Parse a FITS `INSTRUME`-style keyword value ("RGS1" / "RGS2").
    pub fn parse(name: &str) -> Result<Self, SmoothError> {
        match name.trim().to_ascii_uppercase().as_str() {
            "RGS1" | "1" => Ok(Instrument::Rgs1),
            "RGS2" | "2" => Ok(Instrument::Rgs2),
            other => Err(SmoothError::InvalidInstrument(other.to_string())),
        }
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instrument::Rgs1 => write!(f, "RGS1"),
            Instrument::Rgs2 => write!(f, "RGS2"),
        }
    }
}

/// Instrument unit plus spectral (diffraction) order for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationId {
    pub instrument: Instrument,
    /// Diffraction order, scales the reference wavelength grid. Positive.
    pub order: u32,
}

impl ObservationId {
    pub fn new(instrument: Instrument, order: i64) -> Result<Self, SmoothError> {
        if order <= 0 {
            return Err(SmoothError::InvalidOrder(order));
        }
        let order = u32::try_from(order).map_err(|_| SmoothError::InvalidOrder(order))?;
        Ok(Self { instrument, order })
    }
}

/// One wavelength channel of the exposure-corrected grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Lower wavelength bound (Å).
    pub wav_lo: f64,
    /// Upper wavelength bound (Å).
    pub wav_hi: f64,
    /// Exposure time (s).
    pub exposure: f64,
    /// Source counts.
    pub source_counts: f64,
    /// Background counts (already backscale-corrected).
    pub background_counts: f64,
}

impl Channel {
    /// Channel center wavelength.
    pub fn wav_center(&self) -> f64 {
        0.5 * (self.wav_lo + self.wav_hi)
    }
}

/// Ordered sequence of channels; exactly one wavelength interval per index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelGrid {
    channels: Vec<Channel>,
}

impl ChannelGrid {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    /// Build a grid from parallel arrays of energy bounds (keV) and counts.
    ///
    /// Response matrices list channels in increasing energy, which is
    /// decreasing wavelength; the energy bounds swap roles when converted
    /// (wav_lo = hc / e_hi, wav_hi = hc / e_lo).
    pub fn from_energy_bounds(
        e_lo: &[f64],
        e_hi: &[f64],
        exposure: &[f64],
        source_counts: &[f64],
        background_counts: &[f64],
    ) -> Self {
        let n = e_lo
            .len()
            .min(e_hi.len())
            .min(exposure.len())
            .min(source_counts.len())
            .min(background_counts.len());
        let channels = (0..n)
            .map(|i| Channel {
                wav_lo: HC_KEV_ANGSTROM / e_hi[i],
                wav_hi: HC_KEV_ANGSTROM / e_lo[i],
                exposure: exposure[i],
                source_counts: source_counts[i],
                background_counts: background_counts[i],
            })
            .collect();
        Self { channels }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel(&self, i: usize) -> &Channel {
        &self.channels[i]
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Channel> {
        self.channels.iter()
    }

    /// Background counts of every channel, in grid order.
    pub fn background(&self) -> Vec<f64> {
        self.channels.iter().map(|c| c.background_counts).collect()
    }
}

/// Indices of usable channels within the original (unfiltered) detector grid.
///
/// The smoothing core treats this as read-only: it tells the rate remapper
/// where each row of the filtered grid came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoodChannelSet {
    indices: Vec<usize>,
}

impl GoodChannelSet {
    pub fn new(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_parse() {
        assert_eq!(Instrument::parse("RGS1").unwrap(), Instrument::Rgs1);
        assert_eq!(Instrument::parse("rgs2").unwrap(), Instrument::Rgs2);
        assert!(matches!(
            Instrument::parse("EPIC"),
            Err(SmoothError::InvalidInstrument(_))
        ));
    }

    #[test]
    fn test_order_must_be_positive() {
        assert!(ObservationId::new(Instrument::Rgs1, 1).is_ok());
        assert!(matches!(
            ObservationId::new(Instrument::Rgs1, 0),
            Err(SmoothError::InvalidOrder(0))
        ));
        assert!(ObservationId::new(Instrument::Rgs2, -2).is_err());
    }

    #[test]
    fn test_order_above_u32_range_is_rejected() {
        let big = i64::from(u32::MAX) + 1;
        assert!(matches!(
            ObservationId::new(Instrument::Rgs1, big),
            Err(SmoothError::InvalidOrder(_))
        ));
        assert_eq!(
            ObservationId::new(Instrument::Rgs1, i64::from(u32::MAX))
                .unwrap()
                .order,
            u32::MAX
        );
    }

    #[test]
    fn test_energy_to_wavelength_swaps_bounds() {
        let grid = ChannelGrid::from_energy_bounds(
            &[0.5, 1.0],
            &[1.0, 2.0],
            &[1000.0, 1000.0],
            &[10.0, 20.0],
            &[1.0, 2.0],
        );
        assert_eq!(grid.len(), 2);
        let c = grid.channel(0);
        assert!((c.wav_lo - HC_KEV_ANGSTROM / 1.0).abs() < 1e-12);
        assert!((c.wav_hi - HC_KEV_ANGSTROM / 0.5).abs() < 1e-12);
        assert!(c.wav_lo < c.wav_hi);
        assert!((c.wav_center() - 0.5 * (c.wav_lo + c.wav_hi)).abs() < 1e-12);
    }
}
