//! CSV table adapters.
//!
//! These sit outside the numeric core: they turn tabulated instrument exports into
//! [`VelocityFrame`]/[`BottomFrame`] values and write pipeline results back out. Cells that
//! are empty or do not hold a finite number become masked samples; masked samples are written
//! as empty cells.
use crate::data::pipeline::FileResult;
use crate::error::{AdvError, AppResult};
use crate::measurement_types::{BottomFrame, Channel, TimeSeries, VelocityFrame};
use std::path::Path;

/// Name of the timestamp column.
pub const TIME_COLUMN: &str = "time";

/// Instrument field names of the horizontal velocity components.
pub const INSTRUMENT_U: &str = "VelocityX";
/// See [`INSTRUMENT_U`].
pub const INSTRUMENT_V: &str = "VelocityY";
/// Default instrument field mapped to the vertical component.
pub const DEFAULT_VERTICAL_COMPONENT: &str = "VelocityZ1";

/// Instrument field names for `u`, `v` and `w` given the chosen vertical field.
pub fn instrument_fields(vertical_component: &str) -> [&str; 3] {
    [INSTRUMENT_U, INSTRUMENT_V, vertical_component]
}

#[cfg(feature = "storage_csv")]
mod imp {
    use super::*;
    use crate::data::reynolds::{ensure_aligned, OFF_DIAGONAL_PAIRS};
    use csv::{ReaderBuilder, StringRecord, Writer};
    use std::fs::File;
    use tracing::info;

    fn column(headers: &StringRecord, candidates: &[&str]) -> AppResult<usize> {
        candidates
            .iter()
            .find_map(|name| headers.iter().position(|h| h.trim() == *name))
            .ok_or_else(|| AdvError::MissingField(candidates.join(" | ")))
    }

    fn parse_cell(record: &StringRecord, idx: usize) -> f64 {
        record
            .get(idx)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(f64::NAN)
    }

    fn read_columns(path: &Path, columns: &[&[&str]]) -> AppResult<(Vec<f64>, Vec<Vec<f64>>)> {
        let mut reader = ReaderBuilder::new()
            .comment(Some(b'#'))
            .flexible(true)
            .from_path(path)?;
        let headers = reader.headers()?.clone();
        let time_idx = column(&headers, &[TIME_COLUMN])?;
        let idx: Vec<usize> = columns
            .iter()
            .map(|c| column(&headers, c))
            .collect::<AppResult<_>>()?;

        let mut time = Vec::new();
        let mut data = vec![Vec::new(); idx.len()];
        for record in reader.records() {
            let record = record?;
            time.push(parse_cell(&record, time_idx));
            for (col, i) in data.iter_mut().zip(&idx) {
                col.push(parse_cell(&record, *i));
            }
        }
        info!(path = %path.display(), rows = time.len(), "Table loaded");
        Ok((time, data))
    }

    /// Reads a velocity table.
    ///
    /// The file needs a `time` column and either `u`, `v`, `w` columns or the instrument
    /// names `VelocityX`, `VelocityY` and `vertical_component`.
    pub fn read_velocity_csv(path: &Path, vertical_component: &str) -> AppResult<VelocityFrame> {
        let [fu, fv, fw] = instrument_fields(vertical_component);
        let (time, mut cols) = read_columns(
            path,
            &[
                &[Channel::U.name(), fu],
                &[Channel::V.name(), fv],
                &[Channel::W.name(), fw],
            ],
        )?;
        let w = cols.pop().unwrap_or_default();
        let v = cols.pop().unwrap_or_default();
        let u = cols.pop().unwrap_or_default();
        VelocityFrame::from_columns(time, u, v, w)
    }

    /// Reads a bottom-check table with `time` and `BottomDistance` columns.
    pub fn read_bottom_csv(path: &Path) -> AppResult<BottomFrame> {
        let (time, mut cols) = read_columns(path, &[&[BottomFrame::CHANNEL]])?;
        BottomFrame::from_columns(time, cols.pop().unwrap_or_default())
    }

    fn cell(value: Option<f64>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    pub(super) fn write_series(path: &Path, series: &[&TimeSeries]) -> AppResult<()> {
        ensure_aligned(series.iter().copied())?;
        let mut writer = Writer::from_writer(File::create(path)?);
        let mut header = vec![TIME_COLUMN.to_string()];
        header.extend(series.iter().map(|s| s.name().to_string()));
        writer.write_record(&header)?;

        if let Some(first) = series.first() {
            for (row, t) in first.timestamps().iter().enumerate() {
                let mut record = vec![t.to_string()];
                record.extend(series.iter().map(|s| cell(s.values()[row])));
                writer.write_record(&record)?;
            }
        }
        writer.flush()?;
        info!(path = %path.display(), columns = series.len(), "Table written");
        Ok(())
    }

    /// Writes velocities, fluctuations and the six stress-proxy series, one row per sample.
    ///
    /// Columns: `time, u, v, w, u', v', w', u'u', v'v', w'w', u'v', v'w', w'u'`.
    pub fn write_decomposition_csv(path: &Path, result: &FileResult) -> AppResult<()> {
        let d = &result.decomposition;
        let mut columns: Vec<&TimeSeries> = Channel::ALL
            .iter()
            .map(|c| result.velocity.channel(*c))
            .collect();
        columns.extend(Channel::ALL.iter().map(|c| &d.fluctuation[*c]));
        columns.extend(Channel::ALL.iter().map(|c| d.stress.diagonal(*c)));
        columns.extend(OFF_DIAGONAL_PAIRS.iter().map(|(i, j)| d.stress.component(*i, *j)));
        write_series(path, &columns)
    }

    /// Writes the elevation series: `time, elevation`.
    pub fn write_elevation_csv(path: &Path, elevation: &TimeSeries) -> AppResult<()> {
        write_series(path, &[elevation])
    }
}

#[cfg(feature = "storage_csv")]
pub use imp::{read_bottom_csv, read_velocity_csv, write_decomposition_csv, write_elevation_csv};

#[cfg(not(feature = "storage_csv"))]
mod disabled {
    use super::*;

    fn disabled<T>() -> AppResult<T> {
        Err(AdvError::FeatureNotEnabled("storage_csv".to_string()))
    }

    /// CSV support is compiled out; always fails with `FeatureNotEnabled`.
    pub fn read_velocity_csv(_path: &Path, _vertical_component: &str) -> AppResult<VelocityFrame> {
        disabled()
    }

    /// CSV support is compiled out; always fails with `FeatureNotEnabled`.
    pub fn read_bottom_csv(_path: &Path) -> AppResult<BottomFrame> {
        disabled()
    }

    /// CSV support is compiled out; always fails with `FeatureNotEnabled`.
    pub fn write_decomposition_csv(_path: &Path, _result: &FileResult) -> AppResult<()> {
        disabled()
    }

    /// CSV support is compiled out; always fails with `FeatureNotEnabled`.
    pub fn write_elevation_csv(_path: &Path, _elevation: &TimeSeries) -> AppResult<()> {
        disabled()
    }
}

#[cfg(not(feature = "storage_csv"))]
pub use disabled::{read_bottom_csv, read_velocity_csv, write_decomposition_csv, write_elevation_csv};
