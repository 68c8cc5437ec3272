//! Single-pass z-score outlier masking.
//!
//! The mean and sample standard deviation are computed once over the unmasked values of the
//! input, and every sample whose deviation from that mean exceeds `z` standard deviations is
//! masked. There is no iterative re-masking (sigma clipping): a large outlier inflates the
//! standard deviation it is judged against and may survive.
use crate::data::processor::SeriesProcessor;
use crate::error::{AdvError, AppResult};
use crate::measurement_types::TimeSeries;
use crate::validation::{check, is_positive};
use serde::{Deserialize, Serialize};

/// Default outlier threshold, in standard deviations.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Count, mean and sample standard deviation of the unmasked values of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    /// Number of unmasked samples.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator). `None` for a single sample.
    pub std: Option<f64>,
}

/// Computes [`SeriesStats`] over the unmasked samples of `series`.
///
/// Fails with [`AdvError::InsufficientData`] if every sample is masked.
pub fn masked_stats(series: &TimeSeries) -> AppResult<SeriesStats> {
    let count = series.valid_count();
    if count == 0 {
        return Err(AdvError::insufficient(series.name()));
    }
    let mean = series.valid_values().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let ss: f64 = series.valid_values().map(|x| (x - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    });
    Ok(SeriesStats { count, mean, std })
}

/// Mean of the unmasked samples of `series`.
pub fn masked_mean(series: &TimeSeries) -> AppResult<f64> {
    masked_stats(series).map(|s| s.mean)
}

/// Masks every sample deviating from the mean by more than `z` standard deviations.
///
/// The returned series has the same name, index and length. Samples that were already
/// masked stay masked. A series whose unmasked values are all equal, or a single sample, is
/// returned unchanged, whatever the rounding of its computed mean and std.
///
/// # Errors
/// * [`AdvError::InvalidParameter`] if `z` is not a finite positive number.
/// * [`AdvError::InsufficientData`] if the series has no unmasked sample.
pub fn mask_outliers(series: &TimeSeries, z: f64) -> AppResult<TimeSeries> {
    check("z_threshold", is_positive(z))?;
    let stats = masked_stats(series)?;
    if is_constant(series) {
        return Ok(series.clone());
    }
    let limit = match stats.std {
        Some(std) if std > 0.0 => z * std,
        _ => return Ok(series.clone()),
    };
    let values = series
        .values()
        .iter()
        .map(|v| v.filter(|x| (x - stats.mean).abs() <= limit))
        .collect();
    Ok(series.with_values(values))
}

fn is_constant(series: &TimeSeries) -> bool {
    let mut values = series.valid_values();
    match values.next() {
        Some(first) => values.all(|x| x == first),
        None => true,
    }
}

/// [`mask_outliers`] as a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierMask {
    /// Threshold in standard deviations.
    pub z: f64,
}

impl Default for OutlierMask {
    fn default() -> Self {
        Self {
            z: DEFAULT_Z_THRESHOLD,
        }
    }
}

impl OutlierMask {
    /// Creates a mask stage with the given threshold.
    pub fn new(z: f64) -> Self {
        Self { z }
    }
}

impl SeriesProcessor for OutlierMask {
    fn name(&self) -> &'static str {
        "outlier_mask"
    }

    fn validate(&self) -> AppResult<()> {
        check("z_threshold", is_positive(self.z))
    }

    fn process(&self, series: &TimeSeries) -> AppResult<TimeSeries> {
        mask_outliers(series, self.z)
    }
}
