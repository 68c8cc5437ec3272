//! Data processing stages and table adapters.
pub mod bottom;
pub mod log_law;
pub mod netcdf_loader;
pub mod outlier;
pub mod pipeline;
pub mod processor;
pub mod reynolds;
pub mod storage;
