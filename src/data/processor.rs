//! The processing-stage trait shared by the per-series stages.
use crate::error::AppResult;
use crate::measurement_types::TimeSeries;

/// A stage that turns one series into another series on the same index.
///
/// Implementations are pure: they hold only their parameters, and calling
/// `process` twice on the same input gives the same output.
pub trait SeriesProcessor {
    /// Short stage name used in log events.
    fn name(&self) -> &'static str;

    /// Validates the stage's parameters without touching any data.
    fn validate(&self) -> AppResult<()>;

    /// Processes one series.
    fn process(&self, series: &TimeSeries) -> AppResult<TimeSeries>;
}
