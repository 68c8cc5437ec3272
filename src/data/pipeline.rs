//! Per-file processing pipeline.
//!
//! One instrument record (a velocity table and a bottom-check table) goes through:
//!
//! 1. optional outlier masking of `u`, `v` and `w` with one shared threshold,
//! 2. Reynolds decomposition of the (masked) velocity frame,
//! 3. probe-offset normalization of the bottom distances.
//!
//! Every call is independent: the result is a plain value owned by the caller. Collecting
//! results across records (to build a velocity profile) is done with an explicit
//! [`ProfileAccumulator`] that the caller keeps.
use crate::data::bottom::{ElevationSummary, ProbeOffset, DEFAULT_PROBE_OFFSET_M};
use crate::data::outlier::{OutlierMask, DEFAULT_Z_THRESHOLD};
use crate::data::processor::SeriesProcessor;
use crate::data::reynolds::{decompose, Decomposition};
use crate::error::AppResult;
use crate::measurement_types::{BottomFrame, Channel, PerChannel, TimeSeries, VelocityFrame};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

/// Parameters of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Distance from probe head to sampling volume, m.
    pub probe_offset: f64,
    /// Outlier threshold in standard deviations.
    pub z_threshold: f64,
    /// Whether to mask outliers before decomposing.
    pub mask_outliers: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            probe_offset: DEFAULT_PROBE_OFFSET_M,
            z_threshold: DEFAULT_Z_THRESHOLD,
            mask_outliers: true,
        }
    }
}

impl PipelineConfig {
    /// Validates every parameter. The threshold is only checked when masking is enabled.
    pub fn validate(&self) -> AppResult<()> {
        ProbeOffset::new(self.probe_offset).validate()?;
        if self.mask_outliers {
            OutlierMask::new(self.z_threshold).validate()?;
        }
        Ok(())
    }
}

/// Everything derived from one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    /// Velocity frame the decomposition was computed from (masked when masking ran).
    pub velocity: VelocityFrame,
    /// Samples newly masked as outliers in each channel.
    pub masked: PerChannel<usize>,
    /// Means, fluctuations, stress proxies and TKE.
    pub decomposition: Decomposition,
    /// Sample elevation above the bed over time.
    pub elevation: TimeSeries,
}

impl FileResult {
    /// Mean, spread and range of the sample elevation.
    pub fn elevation_summary(&self) -> AppResult<ElevationSummary> {
        ElevationSummary::from_series(&self.elevation)
    }

    /// Reduces the record to one point of a velocity profile.
    pub fn profile_point(&self) -> AppResult<ProfilePoint> {
        Ok(ProfilePoint {
            elevation: self.elevation_summary()?.mean,
            mean_velocity: self.decomposition.mean,
            tke: self.decomposition.tke,
        })
    }
}

/// Runs the full pipeline over one record.
///
/// All parameters are validated before any data is touched.
///
/// # Errors
/// * `InvalidParameter` for an out-of-range probe offset or threshold.
/// * `InsufficientData` if a velocity channel has no valid sample.
/// * `Alignment` if the velocity channels do not share one index.
pub fn process_file(
    velocity: &VelocityFrame,
    bottom: &BottomFrame,
    config: &PipelineConfig,
) -> AppResult<FileResult> {
    config.validate()?;
    let span = info_span!(
        "process_file",
        rows = velocity.len(),
        bottom_rows = bottom.distance().len(),
        mask = config.mask_outliers
    );
    let _guard = span.enter();

    let (velocity, masked) = if config.mask_outliers {
        mask_frame(velocity, &OutlierMask::new(config.z_threshold))?
    } else {
        debug!("Outlier masking disabled");
        (velocity.clone(), PerChannel { u: 0, v: 0, w: 0 })
    };

    let decomposition = decompose(&velocity)?;
    let offset = ProbeOffset::new(config.probe_offset);
    let elevation = offset.process(bottom.distance())?;
    debug!(
        stage = offset.name(),
        probe_offset = config.probe_offset,
        valid = elevation.valid_count(),
        "Bottom distances normalized"
    );

    info!(
        masked_u = masked.u,
        masked_v = masked.v,
        masked_w = masked.w,
        tke = decomposition.tke,
        "Record processed"
    );

    Ok(FileResult {
        velocity,
        masked,
        decomposition,
        elevation,
    })
}

/// Applies one mask stage to every channel of a frame.
///
/// Returns the masked frame and the number of newly masked samples per channel.
pub fn mask_frame(
    frame: &VelocityFrame,
    stage: &impl SeriesProcessor,
) -> AppResult<(VelocityFrame, PerChannel<usize>)> {
    let masked = PerChannel::try_from_fn(|c| stage.process(frame.channel(c)))?;
    let counts = PerChannel::from_fn(|c| {
        masked[c].masked_count() - frame.channel(c).masked_count()
    });
    for c in Channel::ALL {
        debug!(
            stage = stage.name(),
            channel = c.name(),
            masked = counts[c],
            "Channel masked"
        );
    }
    let PerChannel { u, v, w } = masked;
    Ok((VelocityFrame::new(u, v, w)?, counts))
}

/// One record reduced to a point of a vertical profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    /// Mean sample elevation above the bed, m.
    pub elevation: f64,
    /// Mean velocity components, m/s.
    pub mean_velocity: PerChannel<f64>,
    /// Turbulent kinetic energy, m2/s2.
    pub tke: f64,
}

/// Profile points collected across records by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileAccumulator {
    points: Vec<ProfilePoint>,
}

impl ProfileAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a point.
    pub fn push(&mut self, point: ProfilePoint) {
        self.points.push(point);
    }

    /// Adds the profile point of a processed record.
    pub fn push_result(&mut self, result: &FileResult) -> AppResult<()> {
        self.push(result.profile_point()?);
        Ok(())
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `true` if no point was added.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points ordered by increasing elevation.
    pub fn profile(&self) -> Vec<ProfilePoint> {
        let mut points = self.points.clone();
        points.sort_by(|a, b| a.elevation.total_cmp(&b.elevation));
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdvError;
    use tracing_test::traced_test;

    fn velocity() -> VelocityFrame {
        let mut u = vec![0.30; 20];
        u[5] = 3.0;
        let v: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 0.01 } else { -0.01 }).collect();
        let w: Vec<f64> = (0..20).map(|i| 0.001 * (i % 3) as f64).collect();
        let t = (0..20).map(|i| i as f64 / 50.0).collect();
        VelocityFrame::from_columns(t, u, v, w).unwrap()
    }

    fn bottom() -> BottomFrame {
        BottomFrame::from_columns(vec![0.0, 1.0, 2.0], vec![0.10, 0.11, 0.09]).unwrap()
    }

    #[test]
    fn test_masked_and_unmasked_modes() {
        let masked = process_file(&velocity(), &bottom(), &PipelineConfig::default()).unwrap();
        assert_eq!(masked.masked.u, 1);
        assert!(masked.velocity.channel(Channel::U).values()[5].is_none());
        assert!((masked.decomposition.mean.u - 0.30).abs() < 1e-12);

        let raw = process_file(
            &velocity(),
            &bottom(),
            &PipelineConfig {
                mask_outliers: false,
                ..PipelineConfig::default()
            },
        )
        .unwrap();
        assert_eq!(raw.masked.u, 0);
        assert!(raw.decomposition.mean.u > 0.30);
        assert!(raw.decomposition.tke > masked.decomposition.tke);
    }

    #[test]
    fn test_parameters_are_checked_first() {
        let bad_offset = PipelineConfig {
            probe_offset: -0.01,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            process_file(&velocity(), &bottom(), &bad_offset),
            Err(AdvError::InvalidParameter { .. })
        ));

        let bad_z = PipelineConfig {
            z_threshold: 0.0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            process_file(&velocity(), &bottom(), &bad_z),
            Err(AdvError::InvalidParameter { .. })
        ));

        // The threshold is irrelevant when masking is off.
        let unused_z = PipelineConfig {
            mask_outliers: false,
            ..bad_z
        };
        assert!(process_file(&velocity(), &bottom(), &unused_z).is_ok());
    }

    #[test]
    #[traced_test]
    fn test_emits_stage_events() {
        process_file(&velocity(), &bottom(), &PipelineConfig::default()).unwrap();
        assert!(logs_contain("Channel masked"));
        assert!(logs_contain("Reynolds decomposition complete"));
        assert!(logs_contain("Bottom distances normalized"));
        assert!(logs_contain("probe_offset"));
        assert!(logs_contain("Record processed"));
    }

    #[test]
    fn test_profile_point_and_accumulator() {
        let result = process_file(&velocity(), &bottom(), &PipelineConfig::default()).unwrap();
        let point = result.profile_point().unwrap();
        assert!((point.elevation - 0.05).abs() < 1e-12);

        let mut acc = ProfileAccumulator::new();
        acc.push(ProfilePoint {
            elevation: 0.10,
            ..point
        });
        acc.push_result(&result).unwrap();
        acc.push(ProfilePoint {
            elevation: 0.02,
            ..point
        });
        let elevations: Vec<f64> = acc.profile().iter().map(|p| p.elevation).collect();
        assert_eq!(acc.len(), 3);
        assert_eq!(elevations[0], 0.02);
        assert_eq!(elevations[2], 0.10);
    }
}
