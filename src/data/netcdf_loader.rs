//! NetCDF loader for Vectrino profiler exports (feature `storage_netcdf`).
//!
//! The instrument writes two groups below `Data`: `Profiles` (velocity, sampled up to 50 Hz)
//! and `BottomCheck` (distance to bed, about 1 Hz). Each group holds a `time` variable plus
//! many per-sample and scalar/metadata variables. Only variables with the same shape as
//! `time` are kept.
use crate::error::{AdvError, AppResult};
use crate::measurement_types::{BottomFrame, VelocityFrame};
use std::path::Path;

/// Velocity and bottom-check tables read from one instrument file.
#[derive(Debug, Clone)]
pub struct InstrumentRecord {
    /// Velocity components on the profile index.
    pub velocity: VelocityFrame,
    /// Bottom distances on the bottom-check index.
    pub bottom: BottomFrame,
}

#[cfg(feature = "storage_netcdf")]
mod imp {
    use super::*;
    use crate::data::storage::{instrument_fields, TIME_COLUMN};
    use std::collections::HashMap;
    use tracing::{debug, info};

    /// Columns of one group whose shape matches its `time` variable.
    fn time_shaped_columns(group: &netcdf::Group<'_>) -> AppResult<HashMap<String, Vec<f64>>> {
        let time = group
            .variable(TIME_COLUMN)
            .ok_or_else(|| AdvError::MissingField(TIME_COLUMN.to_string()))?;
        let shape: Vec<usize> = time.dimensions().iter().map(|d| d.len()).collect();

        let mut columns = HashMap::new();
        for var in group.variables() {
            let var_shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
            if var_shape != shape {
                debug!(variable = %var.name(), "Skipping variable with mismatched shape");
                continue;
            }
            columns.insert(var.name(), var.get_values::<f64, _>(..)?);
        }
        Ok(columns)
    }

    fn take(columns: &mut HashMap<String, Vec<f64>>, name: &str) -> AppResult<Vec<f64>> {
        columns
            .remove(name)
            .ok_or_else(|| AdvError::MissingField(name.to_string()))
    }

    /// Reads the velocity and bottom-check tables of a Vectrino NetCDF file.
    ///
    /// `VelocityX`, `VelocityY` and `vertical_component` become `u`, `v` and `w`;
    /// `BottomDistance` becomes the bottom frame.
    pub fn read_netcdf(path: &Path, vertical_component: &str) -> AppResult<InstrumentRecord> {
        let file = netcdf::open(path)?;
        let data = file
            .group("Data")?
            .ok_or_else(|| AdvError::MissingField("Data".to_string()))?;

        let profiles = data
            .group("Profiles")
            .ok_or_else(|| AdvError::MissingField("Data/Profiles".to_string()))?;
        let mut cols = time_shaped_columns(&profiles)?;
        let [fu, fv, fw] = instrument_fields(vertical_component);
        let velocity = VelocityFrame::from_columns(
            take(&mut cols, TIME_COLUMN)?,
            take(&mut cols, fu)?,
            take(&mut cols, fv)?,
            take(&mut cols, fw)?,
        )?;

        let bottom_check = data
            .group("BottomCheck")
            .ok_or_else(|| AdvError::MissingField("Data/BottomCheck".to_string()))?;
        let mut cols = time_shaped_columns(&bottom_check)?;
        let bottom = BottomFrame::from_columns(
            take(&mut cols, TIME_COLUMN)?,
            take(&mut cols, BottomFrame::CHANNEL)?,
        )?;

        info!(
            path = %path.display(),
            velocity_rows = velocity.len(),
            bottom_rows = bottom.distance().len(),
            "Instrument file loaded"
        );
        Ok(InstrumentRecord { velocity, bottom })
    }
}

#[cfg(feature = "storage_netcdf")]
pub use imp::read_netcdf;

/// NetCDF support is compiled out; always fails with `FeatureNotEnabled`.
#[cfg(not(feature = "storage_netcdf"))]
pub fn read_netcdf(_path: &Path, _vertical_component: &str) -> AppResult<InstrumentRecord> {
    Err(AdvError::FeatureNotEnabled("storage_netcdf".to_string()))
}

#[cfg(all(test, not(feature = "storage_netcdf")))]
mod tests {
    use super::*;

    #[test]
    fn test_reports_disabled_feature() {
        match read_netcdf(Path::new("record.nc"), "VelocityZ1") {
            Err(AdvError::FeatureNotEnabled(f)) => assert_eq!(f, "storage_netcdf"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
