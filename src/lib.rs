//! Adaptive noise filtering for XMM-Newton RGS background spectra.
//!
//! Smooths a measured background count-rate spectrum while preserving
//! genuine low-frequency spectral structure. Per detector segment (CCD):
//!
//! 1. [`pipeline::segments`] aligns a per-instrument gap template with the
//!    observed channel grid to locate the 9 CCD wavelength ranges.
//! 2. [`pipeline::noise_model`] computes a power spectrum of the
//!    mean-subtracted background trace and fits `C + N·f^a` to it, with
//!    the floor C pinned to the high-frequency band average.
//! 3. [`pipeline::reconstruct`] attenuates each frequency bin by the
//!    modeled structured-power fraction, inverts the transform, and the
//!    smoothed values are merged back into the global channel grid.
//!
//! All inputs and outputs are in-memory arrays; FITS access, parameter
//! parsing, and plotting live in external collaborators.

pub mod data;
pub mod error;
pub mod log;
pub mod pipeline;

pub use data::channels::{
    Channel, ChannelGrid, GoodChannelSet, Instrument, ObservationId, HC_KEV_ANGSTROM,
};
pub use data::exposure::{ExposureConfig, ExposureProfile};
pub use error::SmoothError;
pub use self::log::diagnostics::{DiagnosticTable, ProcessingLog};
pub use pipeline::noise_model::{BandSplit, NoiseModel};
pub use pipeline::rates::{recompute_rates, scatter_to_detector_grid, RateSpectra};
pub use pipeline::segments::{resolve_segment_boundaries, BoundaryResolution, SegmentBounds};
pub use pipeline::smooth::{BkgSmoother, SegmentOutcome, SmoothConfig, SmoothResult};
