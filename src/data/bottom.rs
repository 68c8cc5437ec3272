//! Bottom-distance normalization.
//!
//! The instrument reports the distance between its probe head and the bed. The velocity
//! samples are taken a fixed distance below the probe head, so the elevation of the sampling
//! volume above the bed is the raw distance minus that probe offset.
use crate::data::outlier::masked_stats;
use crate::data::processor::SeriesProcessor;
use crate::error::AppResult;
use crate::measurement_types::{BottomFrame, TimeSeries};
use crate::validation::{check, is_in_range, is_non_negative};
use serde::{Deserialize, Serialize};

/// Default distance between probe head and sampling volume, in metres.
pub const DEFAULT_PROBE_OFFSET_M: f64 = 0.05;

/// Largest accepted probe offset, in metres.
pub const MAX_PROBE_OFFSET_M: f64 = 0.10;

/// Name of the elevation series.
pub const ELEVATION_CHANNEL: &str = "elevation";

/// Checks that `probe_offset` is a finite value within `0..=MAX_PROBE_OFFSET_M`.
pub fn validate_probe_offset(probe_offset: f64) -> AppResult<()> {
    check("probe_offset", is_non_negative(probe_offset))?;
    check(
        "probe_offset",
        is_in_range(probe_offset, 0.0..=MAX_PROBE_OFFSET_M),
    )
}

/// Converts raw bottom distances into sample elevations above the bed.
///
/// Masked readings stay masked; no outlier masking is applied here.
pub fn normalize_bottom(bottom: &BottomFrame, probe_offset: f64) -> AppResult<TimeSeries> {
    ProbeOffset::new(probe_offset).process(bottom.distance())
}

/// Mean, spread and range of an elevation series.
///
/// A large spread or range over one record means the bed moved while the instrument was
/// sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationSummary {
    /// Number of unmasked readings.
    pub count: usize,
    /// Mean elevation, metres.
    pub mean: f64,
    /// Sample standard deviation, metres. `None` for a single reading.
    pub std: Option<f64>,
    /// Lowest elevation, metres.
    pub min: f64,
    /// Highest elevation, metres.
    pub max: f64,
}

impl ElevationSummary {
    /// Summarizes an elevation series. Fails with `InsufficientData` if all readings are masked.
    pub fn from_series(elevation: &TimeSeries) -> AppResult<Self> {
        let stats = masked_stats(elevation)?;
        let (min, max) = elevation
            .valid_values()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            });
        Ok(Self {
            count: stats.count,
            mean: stats.mean,
            std: stats.std,
            min,
            max,
        })
    }
}

/// [`normalize_bottom`] as a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeOffset {
    /// Offset in metres.
    pub offset: f64,
}

impl ProbeOffset {
    /// Creates the stage.
    pub fn new(offset: f64) -> Self {
        Self { offset }
    }
}

impl Default for ProbeOffset {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_OFFSET_M)
    }
}

impl SeriesProcessor for ProbeOffset {
    fn name(&self) -> &'static str {
        "probe_offset"
    }

    fn validate(&self) -> AppResult<()> {
        validate_probe_offset(self.offset)
    }

    /// Subtracts the offset from a distance series, giving the `elevation` series.
    fn process(&self, distance: &TimeSeries) -> AppResult<TimeSeries> {
        self.validate()?;
        let offset = self.offset;
        Ok(distance.map_values(ELEVATION_CHANNEL, |d| d - offset))
    }
}
