//! Per-observation smoothing: boundary resolution, per-segment noise fit
//! and reconstruction, and the merge into the global smoothed array.
//!
//! Segments are processed independently through a pure function; the only
//! shared output is the append-only smoothed buffer and each segment
//! writes a disjoint index range of it, so the loop below could be farmed
//! out to worker threads without locking.

use serde::{Deserialize, Serialize};

use crate::data::channels::{ChannelGrid, ObservationId};
use crate::log::diagnostics::{DiagnosticRow, DiagnosticTable, ProcessingLog};
use crate::pipeline::fit::FitBounds;
use crate::pipeline::noise_model::{fit_segment, BandSplit, NoiseModel};
use crate::pipeline::reconstruct::reconstruct;
use crate::pipeline::segments::{
    collect_segment, resolve_segment_boundaries, BoundaryResolution, SegmentBounds, NUM_SEGMENTS,
};

/// Tunables of one smoothing run.
#[derive(Debug, Clone, Copy)]
pub struct SmoothConfig {
    /// Wavelength inclusion window (Å); channels outside are ignored.
    pub wavelength_window: (f64, f64),
    /// Power-spectrum band split for the noise fit.
    pub bands: BandSplit,
    /// Parameter bounds of the noise fit.
    pub fit_bounds: FitBounds,
    /// Produce the per-channel diagnostic table.
    pub diagnostics: bool,
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            wavelength_window: (0.0, 1000.0),
            bands: BandSplit::default(),
            fit_bounds: FitBounds::default(),
            diagnostics: false,
        }
    }
}

/// Terminal state of one segment after a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SegmentOutcome {
    /// No member channels; the segment's range stays zero-filled.
    SkippedEmpty {
        segment: usize,
        bounds: SegmentBounds,
    },
    /// Model fitted (or fallen back) and trace written.
    Reconstructed {
        segment: usize,
        bounds: SegmentBounds,
        model: NoiseModel,
        /// Grid index range (first, last) of the member channels.
        span: (usize, usize),
    },
}

impl SegmentOutcome {
    pub fn segment(&self) -> usize {
        match self {
            SegmentOutcome::SkippedEmpty { segment, .. } => *segment,
            SegmentOutcome::Reconstructed { segment, .. } => *segment,
        }
    }

    pub fn model(&self) -> Option<&NoiseModel> {
        match self {
            SegmentOutcome::SkippedEmpty { .. } => None,
            SegmentOutcome::Reconstructed { model, .. } => Some(model),
        }
    }
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct SmoothResult {
    /// Smoothed background counts, same indexing as the input grid.
    /// Channels outside every segment extent are zero.
    pub smoothed: Vec<f64>,
    /// Resolved segment boundaries.
    pub boundaries: BoundaryResolution,
    /// Terminal state of each of the 9 segments.
    pub segments: Vec<SegmentOutcome>,
    /// Per-channel before/after table, when diagnostics are enabled.
    pub table: Option<DiagnosticTable>,
}

/// Adaptive background smoother for one RGS observation.
#[derive(Debug, Clone, Default)]
pub struct BkgSmoother {
    config: SmoothConfig,
}

/// What one segment contributes back to the run.
struct SegmentProduct {
    outcome: SegmentOutcome,
    /// (start index, values) to write into the smoothed buffer.
    write: Option<(usize, Vec<f64>)>,
}

impl BkgSmoother {
    pub fn new(config: SmoothConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SmoothConfig {
        &self.config
    }

    /// Smooth the background trace of one observation.
    ///
    /// Never fails: per-segment problems degrade locally (empty segments
    /// are skipped, diverging fits fall back to the flat model). Invalid
    /// instrument descriptions are rejected earlier, when the
    /// [`ObservationId`] is constructed.
    pub fn smooth(
        &self,
        observation: ObservationId,
        grid: &ChannelGrid,
        log: &mut ProcessingLog,
    ) -> SmoothResult {
        let boundaries = resolve_segment_boundaries(observation, grid);
        log.info(
            None,
            format!(
                "{} order {}: template offset {:+.2} ({} boundary misses)",
                observation.instrument, observation.order, boundaries.offset, boundaries.misses
            ),
        );

        let mut smoothed = vec![0.0; grid.len()];
        let mut segments = Vec::with_capacity(NUM_SEGMENTS);

        for (index, &bounds) in boundaries.bounds.iter().enumerate() {
            let product = self.process_segment(grid, index, bounds, log);
            if let Some((start, values)) = &product.write {
                smoothed[*start..*start + values.len()].copy_from_slice(values);
            }
            segments.push(product.outcome);
        }

        let table = self.config.diagnostics.then(|| {
            let mut table = DiagnosticTable::default();
            for outcome in &segments {
                if let SegmentOutcome::Reconstructed { segment, span, .. } = outcome {
                    for i in span.0..span.1 {
                        table.rows.push(DiagnosticRow {
                            segment: *segment,
                            wavelength: grid.channel(i).wav_center(),
                            counts: grid.channel(i).background_counts,
                            smoothed: smoothed[i],
                        });
                    }
                }
            }
            table
        });

        SmoothResult {
            smoothed,
            boundaries,
            segments,
            table,
        }
    }

    /// Process one segment: select, fit, reconstruct. Pure apart from the
    /// diagnostic log; writes nothing shared.
    fn process_segment(
        &self,
        grid: &ChannelGrid,
        index: usize,
        bounds: SegmentBounds,
        log: &mut ProcessingLog,
    ) -> SegmentProduct {
        let data = collect_segment(grid, bounds, self.config.wavelength_window);
        let Some((first, last)) = data.span else {
            log::info!("segment {index} has no member channels, skipping");
            log.info(Some(index), "no member channels, skipped");
            return SegmentProduct {
                outcome: SegmentOutcome::SkippedEmpty {
                    segment: index,
                    bounds,
                },
                write: None,
            };
        };

        let fitted = fit_segment(&data.values, &self.config.bands, &self.config.fit_bounds);
        let model = fitted.model;
        if model.converged {
            log.info(
                Some(index),
                format!(
                    "noise model C={:.4e} N={:.4e} a={:.3}",
                    model.floor, model.amplitude, model.exponent
                ),
            );
        } else {
            log.warning(
                Some(index),
                format!("fit fallback: flat model with C={:.4e}", model.floor),
            );
        }

        let trace = reconstruct(&fitted);

        // The last used index stays untouched: the smoothing never extends
        // past the observed segment extent.
        let n_write = (last - first).min(trace.len());
        let write = (n_write > 0).then(|| (first, trace[..n_write].to_vec()));

        SegmentProduct {
            outcome: SegmentOutcome::Reconstructed {
                segment: index,
                bounds,
                model,
                span: (first, last),
            },
            write,
        }
    }
}
