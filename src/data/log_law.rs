//! Uniform-flow relations for a rectangular flume and the log-law velocity profile.
//!
//! For uniform flow the bed shear stress balances the streamwise weight component,
//! `tau_0 = rho g R_h S_0`, and the shear velocity is `u* = sqrt(tau_0 / rho)`. Away from the
//! wall the mean streamwise velocity follows
//!
//! ```text
//! u(y) = (u* / kappa) ln(y u* / nu) + B u*
//! ```
//!
//! with von Karman constant `kappa = 0.41` and `B = 5.0`. The law is singular at `y = 0`, so
//! the profile grid starts a small fraction of the depth above the bed.
use crate::error::AppResult;
use crate::validation::{check, is_in_range, is_positive};
use serde::{Deserialize, Serialize};

/// Von Karman constant.
pub const VON_KARMAN: f64 = 0.41;

/// Additive constant of the smooth-wall log-law.
pub const LOG_LAW_B: f64 = 5.0;

/// Standard gravitational acceleration, m/s2.
pub const DEFAULT_GRAVITY: f64 = 9.81;

/// Kinematic viscosity of water near 20 C, m2/s.
pub const DEFAULT_KINEMATIC_VISCOSITY: f64 = 1.0e-6;

/// Density of water, kg/m3.
pub const DEFAULT_WATER_DENSITY: f64 = 1000.0;

/// Default number of points in a profile.
pub const DEFAULT_RESOLUTION: usize = 200;

/// Lowest grid elevation as a fraction of the depth.
pub const NEAR_BED_FRACTION: f64 = 1.0e-5;

/// Cross-section of a rectangular open channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelGeometry {
    /// Channel width, m.
    pub width: f64,
    /// Flow depth, m.
    pub depth: f64,
}

impl ChannelGeometry {
    /// Creates a geometry, requiring positive finite width and depth.
    pub fn new(width: f64, depth: f64) -> AppResult<Self> {
        check("width", is_positive(width))?;
        check("depth", is_positive(depth))?;
        Ok(Self { width, depth })
    }

    /// Cross-sectional flow area, m2.
    pub fn area(&self) -> f64 {
        self.width * self.depth
    }

    /// Wetted perimeter (bed plus both walls), m.
    pub fn wetted_perimeter(&self) -> f64 {
        self.width + 2.0 * self.depth
    }

    /// Hydraulic radius, area over wetted perimeter, m.
    pub fn hydraulic_radius(&self) -> f64 {
        self.area() / self.wetted_perimeter()
    }

    /// Bed shear stress for uniform flow on `slope`, Pa.
    pub fn bed_shear_stress(&self, rho: f64, g: f64, slope: f64) -> AppResult<f64> {
        check("water_density", is_positive(rho))?;
        check("gravity", is_positive(g))?;
        check("slope", is_positive(slope))?;
        Ok(rho * g * self.hydraulic_radius() * slope)
    }

    /// Shear velocity for uniform flow on `slope`, m/s.
    pub fn shear_velocity(&self, g: f64, slope: f64) -> AppResult<f64> {
        check("gravity", is_positive(g))?;
        check("slope", is_positive(slope))?;
        Ok((g * slope * self.hydraulic_radius()).sqrt())
    }
}

/// Inputs of the log-law profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogLawParams {
    /// Flow depth, m.
    pub depth: f64,
    /// Channel width, m.
    pub width: f64,
    /// Bed slope, m/m.
    pub slope: f64,
    /// Gravitational acceleration, m/s2.
    pub gravity: f64,
    /// Kinematic viscosity, m2/s.
    pub kinematic_viscosity: f64,
    /// Number of grid points.
    pub resolution: usize,
}

impl LogLawParams {
    /// Parameters with default gravity, viscosity and resolution.
    pub fn new(depth: f64, width: f64, slope: f64) -> Self {
        Self {
            depth,
            width,
            slope,
            gravity: DEFAULT_GRAVITY,
            kinematic_viscosity: DEFAULT_KINEMATIC_VISCOSITY,
            resolution: DEFAULT_RESOLUTION,
        }
    }

    /// Overrides the gravitational acceleration.
    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    /// Overrides the kinematic viscosity.
    pub fn with_kinematic_viscosity(mut self, nu: f64) -> Self {
        self.kinematic_viscosity = nu;
        self
    }

    /// Overrides the number of grid points.
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    /// Checks every precondition of [`log_law_profile`].
    pub fn validate(&self) -> AppResult<()> {
        check("depth", is_positive(self.depth))?;
        check("width", is_positive(self.width))?;
        check("slope", is_positive(self.slope))?;
        check("gravity", is_positive(self.gravity))?;
        check("kinematic_viscosity", is_positive(self.kinematic_viscosity))?;
        check("resolution", is_in_range(self.resolution, 2..=usize::MAX))
    }
}

/// One `(elevation, velocity)` sample of a model profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSample {
    /// Height above the bed, m.
    pub elevation: f64,
    /// Model streamwise velocity, m/s.
    pub velocity: f64,
}

/// A log-law profile together with the flow scales it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLawProfile {
    /// Hydraulic radius of the cross-section, m.
    pub hydraulic_radius: f64,
    /// Shear velocity, m/s.
    pub shear_velocity: f64,
    /// Samples ordered by increasing elevation.
    pub samples: Vec<ProfileSample>,
}

/// Log-law velocity at elevation `y` for shear velocity `u_star` and viscosity `nu`.
pub fn log_law_velocity(y: f64, u_star: f64, nu: f64) -> f64 {
    (u_star / VON_KARMAN) * (y * u_star / nu).ln() + LOG_LAW_B * u_star
}

/// `n` geometrically spaced points from `start` to `end`, endpoints exact.
///
/// Both bounds must be positive and `n >= 2`.
pub fn geometric_grid(start: f64, end: f64, n: usize) -> Vec<f64> {
    let ratio = (end / start).ln();
    let last = n - 1;
    (0..n)
        .map(|i| match i {
            0 => start,
            i if i == last => end,
            i => start * (ratio * i as f64 / last as f64).exp(),
        })
        .collect()
}

/// Theoretical turbulent velocity profile for uniform flow in a rectangular channel.
///
/// # Errors
/// [`crate::error::AdvError::InvalidParameter`] if depth, width, slope, gravity or viscosity
/// is not a finite positive number, or the resolution is below two points.
pub fn log_law_profile(params: &LogLawParams) -> AppResult<LogLawProfile> {
    params.validate()?;
    let geometry = ChannelGeometry::new(params.width, params.depth)?;
    let u_star = geometry.shear_velocity(params.gravity, params.slope)?;
    let samples = geometric_grid(
        params.depth * NEAR_BED_FRACTION,
        params.depth,
        params.resolution,
    )
    .into_iter()
    .map(|y| ProfileSample {
        elevation: y,
        velocity: log_law_velocity(y, u_star, params.kinematic_viscosity),
    })
    .collect();
    Ok(LogLawProfile {
        hydraulic_radius: geometry.hydraulic_radius(),
        shear_velocity: u_star,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdvError;

    fn lab_params() -> LogLawParams {
        LogLawParams::new(0.15, 0.205, 0.001)
    }

    #[test]
    fn test_uniform_flow_relations() {
        let g = ChannelGeometry::new(0.205, 0.15).unwrap();
        assert!((g.area() - 0.03075).abs() < 1e-12);
        assert!((g.wetted_perimeter() - 0.505).abs() < 1e-12);
        let r = 0.03075 / 0.505;
        assert!((g.hydraulic_radius() - r).abs() < 1e-12);
        let tau = g.bed_shear_stress(1000.0, 9.81, 0.001).unwrap();
        let u_star = g.shear_velocity(9.81, 0.001).unwrap();
        assert!((u_star - (tau / 1000.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_profile_spans_near_bed_to_depth() {
        let p = log_law_profile(&lab_params()).unwrap();
        assert_eq!(p.samples.len(), DEFAULT_RESOLUTION);
        assert_eq!(p.samples[0].elevation, 0.15 * NEAR_BED_FRACTION);
        assert_eq!(p.samples[DEFAULT_RESOLUTION - 1].elevation, 0.15);
        assert!(p.samples.iter().all(|s| s.elevation > 0.0));
        let expected = (9.81 * 0.001 * (0.03075_f64 / 0.505)).sqrt();
        assert!((p.shear_velocity - expected).abs() < 1e-12);
    }

    #[test]
    fn test_profile_is_strictly_increasing() {
        let p = log_law_profile(&lab_params()).unwrap();
        for pair in p.samples.windows(2) {
            assert!(pair[1].elevation > pair[0].elevation);
            assert!(pair[1].velocity > pair[0].velocity);
        }
        let top = p.samples.last().unwrap();
        let max = p
            .samples
            .iter()
            .map(|s| s.velocity)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(top.velocity, max);
    }

    #[test]
    fn test_velocity_matches_formula() {
        let p = log_law_profile(&lab_params()).unwrap();
        let top = p.samples.last().unwrap();
        let u_star = p.shear_velocity;
        let expected = u_star / 0.41 * (0.15 * u_star / 1.0e-6).ln() + 5.0 * u_star;
        assert!((top.velocity - expected).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_geometry() {
        for params in [
            LogLawParams::new(0.0, 0.205, 0.001),
            LogLawParams::new(0.15, -1.0, 0.001),
            LogLawParams::new(0.15, 0.205, 0.0),
            LogLawParams::new(0.15, 0.205, -0.001),
            lab_params().with_kinematic_viscosity(0.0),
            lab_params().with_gravity(f64::NAN),
            lab_params().with_resolution(1),
        ] {
            assert!(matches!(
                log_law_profile(&params),
                Err(AdvError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_geometric_grid_ratio_is_constant() {
        let grid = geometric_grid(1.0, 1000.0, 4);
        assert_eq!(grid[0], 1.0);
        assert_eq!(grid[3], 1000.0);
        assert!((grid[1] - 10.0).abs() < 1e-9);
        assert!((grid[2] - 100.0).abs() < 1e-9);
    }
}
