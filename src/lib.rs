//! # ADV Turbulence Library
//!
//! Turbulence statistics from acoustic Doppler velocimeter (ADV) records. One record is a
//! velocity table (`u`, `v`, `w` at up to 50 Hz) and a bottom-check table (distance to the bed
//! at about 1 Hz). From it the crate derives outlier-masked velocities, the Reynolds
//! decomposition, the six independent Reynolds stress components, the turbulent kinetic
//! energy, and the elevation of the sampling volume above the bed. The log-law velocity
//! profile of the flume is available for comparison against the measured means.
//!
//! ## Crate Structure
//!
//! - **`measurement_types`**: `TimeSeries`, `VelocityFrame`, `BottomFrame` and the
//!   per-channel record type.
//! - **`data`**: the processing stages (`outlier`, `bottom`, `reynolds`, `log_law`), the
//!   per-record `pipeline`, and table adapters (`storage` for CSV, `netcdf_loader`).
//! - **`error`**: the `AdvError` enum used across the crate.
//! - **`config`**: layered configuration (defaults, TOML file, `ADV_` environment).
//! - **`tracing_setup`**: subscriber initialization for binaries.
//! - **`validation`**: parameter validation helpers.
//!
//! ## Example
//!
//! ```
//! use adv_turbulence::data::pipeline::{process_file, PipelineConfig};
//! use adv_turbulence::measurement_types::{BottomFrame, VelocityFrame};
//!
//! let t = vec![0.0, 0.02, 0.04, 0.06];
//! let velocity = VelocityFrame::from_columns(
//!     t,
//!     vec![0.30, 0.32, 0.29, 0.31],
//!     vec![0.01, -0.01, 0.00, 0.00],
//!     vec![0.002, -0.001, 0.000, -0.001],
//! )?;
//! let bottom = BottomFrame::from_columns(vec![0.0, 1.0], vec![0.10, 0.11])?;
//!
//! let result = process_file(&velocity, &bottom, &PipelineConfig::default())?;
//! assert!(result.decomposition.tke >= 0.0);
//! # Ok::<(), adv_turbulence::error::AdvError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod measurement_types;
pub mod tracing_setup;
pub mod validation;

pub use data::log_law::{log_law_profile, LogLawParams, LogLawProfile};
pub use data::pipeline::{process_file, FileResult, PipelineConfig, ProfileAccumulator};
pub use data::reynolds::{decompose, Decomposition, ReynoldsStress};
pub use error::{AdvError, AppResult};
pub use measurement_types::{BottomFrame, Channel, TimeSeries, VelocityFrame};
