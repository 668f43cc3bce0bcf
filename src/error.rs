use thiserror::Error;

/// Fatal errors of the smoothing core.
///
/// Everything that can go wrong inside a single segment (no member
/// channels, diverging model fit, degenerate filter) is recovered
/// locally and reported through [`crate::pipeline::smooth::SegmentOutcome`]
/// instead; only an unusable instrument description aborts a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SmoothError {
    #[error("Unrecognized instrument: {0:?} (expected RGS1 or RGS2)")]
    InvalidInstrument(String),
    #[error("Invalid diffraction order: {0} (must be a positive integer)")]
    InvalidOrder(i64),
}
