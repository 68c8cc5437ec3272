//! Configuration loading using Figment.
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. built-in defaults (the lab flume and a 5 cm probe offset),
//! 2. a TOML file (`config/adv.toml` unless another path is given; a missing file is fine),
//! 3. environment variables prefixed with `ADV_`, using `__` between section and key.
//!
//! # Example
//! ```no_run
//! use adv_turbulence::config::AnalysisConfig;
//!
//! // ADV_PIPELINE__Z_THRESHOLD=2.5 overrides pipeline.z_threshold
//! let config = AnalysisConfig::load()?;
//! config.validate()?;
//! println!("probe offset: {} m", config.pipeline.probe_offset);
//! # Ok::<(), adv_turbulence::error::AdvError>(())
//! ```

use crate::data::bottom::{validate_probe_offset, DEFAULT_PROBE_OFFSET_M};
use crate::data::log_law::{
    LogLawParams, DEFAULT_GRAVITY, DEFAULT_KINEMATIC_VISCOSITY, DEFAULT_RESOLUTION,
    DEFAULT_WATER_DENSITY,
};
use crate::data::outlier::DEFAULT_Z_THRESHOLD;
use crate::data::pipeline::PipelineConfig;
use crate::data::storage::DEFAULT_VERTICAL_COMPONENT;
use crate::error::{AdvError, AppResult};
use crate::validation::{check, is_not_empty, is_positive};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/adv.toml";

/// Prefix of overriding environment variables.
pub const ENV_PREFIX: &str = "ADV_";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalysisConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-record pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineSettings,
    /// Flume geometry and fluid properties for the log-law model.
    #[serde(default)]
    pub flume: FlumeConfig,
    /// Input table settings.
    #[serde(default)]
    pub input: InputConfig,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (pretty, compact, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

/// Pipeline settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Distance between probe head and sampling volume, m.
    #[serde(default = "default_probe_offset")]
    pub probe_offset: f64,
    /// Outlier threshold in standard deviations.
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,
    /// Mask outliers before decomposing.
    #[serde(default = "default_enabled")]
    pub mask_outliers: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            probe_offset: default_probe_offset(),
            z_threshold: default_z_threshold(),
            mask_outliers: default_enabled(),
        }
    }
}

impl From<PipelineSettings> for PipelineConfig {
    fn from(s: PipelineSettings) -> Self {
        PipelineConfig {
            probe_offset: s.probe_offset,
            z_threshold: s.z_threshold,
            mask_outliers: s.mask_outliers,
        }
    }
}

/// Flume geometry and fluid properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlumeConfig {
    /// Flow depth, m.
    pub depth: f64,
    /// Flume width, m.
    pub width: f64,
    /// Bed slope, m/m.
    pub slope: f64,
    /// Gravitational acceleration, m/s2.
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    /// Kinematic viscosity, m2/s.
    #[serde(default = "default_kinematic_viscosity")]
    pub kinematic_viscosity: f64,
    /// Water density, kg/m3.
    #[serde(default = "default_water_density")]
    pub water_density: f64,
    /// Number of points of the model profile.
    #[serde(default = "default_resolution")]
    pub resolution: usize,
}

impl Default for FlumeConfig {
    fn default() -> Self {
        Self {
            depth: 0.15,
            width: 0.29,
            slope: 0.001,
            gravity: default_gravity(),
            kinematic_viscosity: default_kinematic_viscosity(),
            water_density: default_water_density(),
            resolution: default_resolution(),
        }
    }
}

impl FlumeConfig {
    /// Log-law parameters for this flume.
    pub fn log_law_params(&self) -> LogLawParams {
        LogLawParams::new(self.depth, self.width, self.slope)
            .with_gravity(self.gravity)
            .with_kinematic_viscosity(self.kinematic_viscosity)
            .with_resolution(self.resolution)
    }
}

/// Input table settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Instrument field read as the vertical component `w`.
    pub vertical_component: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            vertical_component: DEFAULT_VERTICAL_COMPONENT.to_string(),
        }
    }
}

// Default value functions
fn default_probe_offset() -> f64 {
    DEFAULT_PROBE_OFFSET_M
}

fn default_z_threshold() -> f64 {
    DEFAULT_Z_THRESHOLD
}

fn default_enabled() -> bool {
    true
}

fn default_gravity() -> f64 {
    DEFAULT_GRAVITY
}

fn default_kinematic_viscosity() -> f64 {
    DEFAULT_KINEMATIC_VISCOSITY
}

fn default_water_density() -> f64 {
    DEFAULT_WATER_DENSITY
}

fn default_resolution() -> usize {
    DEFAULT_RESOLUTION
}

impl AnalysisConfig {
    /// Load configuration from the default file and environment variables.
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path plus environment overrides.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        Ok(Self::figment(path.as_ref()).extract()?)
    }

    /// The layered provider stack, exposed for callers that merge further sources.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AnalysisConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(AdvError::invalid(
                "logging.level",
                format!(
                    "'{}' must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(AdvError::invalid(
                "logging.format",
                format!(
                    "'{}' must be one of: {}",
                    self.logging.format,
                    valid_formats.join(", ")
                ),
            ));
        }

        validate_probe_offset(self.pipeline.probe_offset)?;
        check("pipeline.z_threshold", is_positive(self.pipeline.z_threshold))?;
        check("flume.water_density", is_positive(self.flume.water_density))?;
        self.flume.log_law_params().validate()?;
        check(
            "input.vertical_component",
            is_not_empty(&self.input.vertical_component),
        )
    }

    /// Pipeline parameters for one record.
    pub fn pipeline_config(&self) -> PipelineConfig {
        self.pipeline.into()
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> AppResult<String> {
        toml::to_string_pretty(self).map_err(|e| AdvError::invalid("config", e.to_string()))
    }
}
