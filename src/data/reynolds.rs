//! Reynolds decomposition of a velocity record.
//!
//! Each velocity component is split into its temporal mean and a fluctuation series,
//! `u_i(t) = U_i + u_i'(t)`. Products of fluctuations give the Reynolds stress proxies
//! `u_i'u_j'`, whose temporal means form the symmetric Reynolds stress tensor. Only six of
//! its nine entries are independent; [`ReynoldsStress`] holds exactly those six.
//!
//! # Off-diagonal pairing
//!
//! The off-diagonal slots follow the cyclic convention of [`OFF_DIAGONAL_PAIRS`]:
//! `u'v'`, `v'w'`, `w'u'`. Any other ordering of a pair (e.g. `v'u'`) resolves to the same
//! slot through [`ReynoldsStress::component`].
use crate::data::outlier::masked_mean;
use crate::error::{AdvError, AppResult};
use crate::measurement_types::{Channel, PerChannel, TimeSeries, VelocityFrame};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Channel pairs of the off-diagonal slots, in slot order `uv`, `vw`, `wu`.
pub const OFF_DIAGONAL_PAIRS: [(Channel, Channel); 3] = [
    (Channel::U, Channel::V),
    (Channel::V, Channel::W),
    (Channel::W, Channel::U),
];

/// The six independent entries of a symmetric 3x3 tensor over the velocity channels.
///
/// Used both for the pointwise stress-proxy series (`ReynoldsStress<TimeSeries>`) and for
/// their temporal means (`ReynoldsStress<f64>`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReynoldsStress<T> {
    /// `u'u'`
    pub uu: T,
    /// `v'v'`
    pub vv: T,
    /// `w'w'`
    pub ww: T,
    /// `u'v'`
    pub uv: T,
    /// `v'w'`
    pub vw: T,
    /// `w'u'`
    pub wu: T,
}

impl<T> ReynoldsStress<T> {
    /// Entry `(i, j)`; `component(a, b)` and `component(b, a)` are the same slot.
    pub fn component(&self, i: Channel, j: Channel) -> &T {
        use Channel::{U, V, W};
        match (i, j) {
            (U, U) => &self.uu,
            (V, V) => &self.vv,
            (W, W) => &self.ww,
            (U, V) | (V, U) => &self.uv,
            (V, W) | (W, V) => &self.vw,
            (W, U) | (U, W) => &self.wu,
        }
    }

    /// Diagonal entry of one channel.
    pub fn diagonal(&self, channel: Channel) -> &T {
        self.component(channel, channel)
    }

    /// Diagonal entries in channel order.
    pub fn diagonals(&self) -> [&T; 3] {
        [&self.uu, &self.vv, &self.ww]
    }

    /// Off-diagonal entries in [`OFF_DIAGONAL_PAIRS`] order.
    pub fn off_diagonals(&self) -> [&T; 3] {
        [&self.uv, &self.vw, &self.wu]
    }

    /// All six entries: diagonal first, then off-diagonal.
    pub fn entries(&self) -> [&T; 6] {
        [&self.uu, &self.vv, &self.ww, &self.uv, &self.vw, &self.wu]
    }

    /// Applies `f` to every entry.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> ReynoldsStress<U> {
        ReynoldsStress {
            uu: f(&self.uu),
            vv: f(&self.vv),
            ww: f(&self.ww),
            uv: f(&self.uv),
            vw: f(&self.vw),
            wu: f(&self.wu),
        }
    }

    /// Fallible [`ReynoldsStress::map`].
    pub fn try_map<U, E>(&self, mut f: impl FnMut(&T) -> Result<U, E>) -> Result<ReynoldsStress<U>, E> {
        Ok(ReynoldsStress {
            uu: f(&self.uu)?,
            vv: f(&self.vv)?,
            ww: f(&self.ww)?,
            uv: f(&self.uv)?,
            vw: f(&self.vw)?,
            wu: f(&self.wu)?,
        })
    }
}

impl<T: Copy> ReynoldsStress<T> {
    /// Expands the six entries into the full symmetric matrix, rows and columns in
    /// `u, v, w` order.
    pub fn to_matrix(&self) -> [[T; 3]; 3] {
        let row = |i: Channel| Channel::ALL.map(|j| *self.component(i, j));
        Channel::ALL.map(row)
    }
}

impl ReynoldsStress<f64> {
    /// Half the trace: the turbulent kinetic energy when the entries are mean stresses.
    pub fn half_trace(&self) -> f64 {
        0.5 * (self.uu + self.vv + self.ww)
    }
}

/// Name of the fluctuation series of a channel, e.g. `u'`.
pub fn fluctuation_name(channel: Channel) -> String {
    format!("{}'", channel.name())
}

/// Name of a stress-proxy series, e.g. `u'v'`.
pub fn product_name(i: Channel, j: Channel) -> String {
    format!("{}'{}'", i.name(), j.name())
}

/// Result of decomposing one velocity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    /// Temporal mean of each channel over its unmasked samples.
    pub mean: PerChannel<f64>,
    /// `value - mean` for each channel, on the input index.
    pub fluctuation: PerChannel<TimeSeries>,
    /// Pointwise fluctuation products: `variance_like` on the diagonal slots,
    /// `covariance_like` on the off-diagonal slots.
    pub stress: ReynoldsStress<TimeSeries>,
    /// Turbulent kinetic energy, half the sum of the means of the diagonal series.
    pub tke: f64,
}

impl Decomposition {
    /// Time-averaged stress proxies `<u_i'u_j'>` over unmasked samples.
    ///
    /// A slot whose series is fully masked (possible off the diagonal when two channels
    /// were masked at disjoint instants) fails with `InsufficientData`.
    pub fn mean_stress(&self) -> AppResult<ReynoldsStress<f64>> {
        self.stress.try_map(masked_mean)
    }

    /// Reynolds stress tensor `tau'_ij = -rho <u_i'u_j'>`, in Pa for `rho` in kg/m3.
    pub fn reynolds_stress(&self, rho: f64) -> AppResult<ReynoldsStress<f64>> {
        Ok(self.mean_stress()?.map(|s| -rho * s))
    }

    /// Root-mean-square fluctuation of each channel.
    pub fn rms(&self) -> AppResult<PerChannel<f64>> {
        PerChannel::try_from_fn(|c| masked_mean(self.stress.diagonal(c)).map(f64::sqrt))
    }

    /// Magnitude of the mean velocity vector.
    pub fn mean_speed(&self) -> f64 {
        (self.mean.u.powi(2) + self.mean.v.powi(2) + self.mean.w.powi(2)).sqrt()
    }

    /// RMS fluctuation of each channel relative to the mean speed.
    ///
    /// `None` when the mean speed is zero and the intensity is undefined.
    pub fn turbulence_intensity(&self) -> AppResult<Option<PerChannel<f64>>> {
        let speed = self.mean_speed();
        if speed == 0.0 {
            return Ok(None);
        }
        Ok(Some(self.rms()?.map(|r| r / speed)))
    }
}

/// Decomposes a velocity record into means, fluctuations, stress proxies and TKE.
///
/// # Errors
/// * [`AdvError::InsufficientData`] if any channel has no unmasked sample.
/// * [`AdvError::Alignment`] if two fluctuation series do not share an index.
pub fn decompose(frame: &VelocityFrame) -> AppResult<Decomposition> {
    let mean = PerChannel::try_from_fn(|c| masked_mean(frame.channel(c)))?;
    let fluctuation =
        PerChannel::from_fn(|c| frame.channel(c).map_values(fluctuation_name(c), |x| x - mean[c]));
    ensure_aligned(fluctuation.iter().map(|(_, s)| s))?;

    let square = |c: Channel| {
        let f = &fluctuation[c];
        f.zip_with(f, product_name(c, c), |a, b| a * b)
    };
    let cross = |(i, j): (Channel, Channel)| {
        fluctuation[i].zip_with(&fluctuation[j], product_name(i, j), |a, b| a * b)
    };
    let [uv, vw, wu] = OFF_DIAGONAL_PAIRS;
    let stress = ReynoldsStress {
        uu: square(Channel::U)?,
        vv: square(Channel::V)?,
        ww: square(Channel::W)?,
        uv: cross(uv)?,
        vw: cross(vw)?,
        wu: cross(wu)?,
    };

    let mut trace = 0.0;
    for s in stress.diagonals() {
        trace += masked_mean(s)?;
    }
    let tke = 0.5 * trace;

    debug!(
        rows = frame.len(),
        mean_u = mean.u,
        mean_v = mean.v,
        mean_w = mean.w,
        tke,
        "Reynolds decomposition complete"
    );

    Ok(Decomposition {
        mean,
        fluctuation,
        stress,
        tke,
    })
}

/// Checks that every series in `series` shares the index of the first one.
pub fn ensure_aligned<'a>(series: impl IntoIterator<Item = &'a TimeSeries>) -> AppResult<()> {
    let mut iter = series.into_iter();
    let Some(first) = iter.next() else {
        return Ok(());
    };
    for s in iter {
        if !first.shares_index(s) {
            return Err(AdvError::Alignment(format!(
                "'{}' and '{}' are not sampled at the same instants",
                first.name(),
                s.name()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(u: &[f64], v: &[f64], w: &[f64]) -> VelocityFrame {
        let t: Vec<f64> = (0..u.len()).map(|i| i as f64 * 0.02).collect();
        VelocityFrame::from_columns(t, u.to_vec(), v.to_vec(), w.to_vec()).unwrap()
    }

    fn sample_frame() -> VelocityFrame {
        frame(
            &[0.31, 0.28, 0.35, 0.30, 0.26, 0.33, 0.29, 0.32],
            &[0.01, -0.02, 0.00, 0.03, -0.01, 0.02, -0.03, 0.00],
            &[-0.005, 0.004, 0.010, -0.008, 0.002, -0.001, 0.006, -0.007],
        )
    }

    #[test]
    fn test_constant_frame_has_no_turbulence() {
        let d = decompose(&frame(&[2.0; 3], &[0.0; 3], &[0.0; 3])).unwrap();
        assert_eq!(d.mean, PerChannel { u: 2.0, v: 0.0, w: 0.0 });
        for (_, f) in d.fluctuation.iter() {
            assert!(f.values().iter().all(|v| *v == Some(0.0)));
        }
        for s in d.stress.entries() {
            assert_eq!(s.len(), 3);
            assert!(s.values().iter().all(|v| *v == Some(0.0)));
        }
        assert_eq!(d.tke, 0.0);
    }

    #[test]
    fn test_fluctuations_average_to_zero() {
        let frame = sample_frame();
        let d = decompose(&frame).unwrap();
        for c in Channel::ALL {
            let m = masked_mean(&d.fluctuation[c]).unwrap();
            let scale = d.mean[c].abs().max(1.0);
            assert!(m.abs() <= 1e-9 * scale, "mean of {}' = {}", c, m);
        }
    }

    #[test]
    fn test_stress_slots_follow_pairing_table() {
        let d = decompose(&sample_frame()).unwrap();
        let names: Vec<&str> = d.stress.entries().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["u'u'", "v'v'", "w'w'", "u'v'", "v'w'", "w'u'"]);
        for ((i, j), slot) in OFF_DIAGONAL_PAIRS.iter().zip(d.stress.off_diagonals()) {
            assert_eq!(slot.name(), product_name(*i, *j));
        }
    }

    #[test]
    fn test_component_lookup_is_symmetric() {
        let d = decompose(&sample_frame()).unwrap();
        for i in Channel::ALL {
            for j in Channel::ALL {
                let ij = d.stress.component(i, j);
                let ji = d.stress.component(j, i);
                assert_eq!(ij, ji);
                // The stored product matches the product recomputed in the other order.
                let recomputed = d.fluctuation[j]
                    .zip_with(&d.fluctuation[i], "x", |a, b| a * b)
                    .unwrap();
                for (a, b) in ij.values().iter().zip(recomputed.values()) {
                    assert_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn test_tke_is_half_trace_of_mean_stress() {
        let d = decompose(&sample_frame()).unwrap();
        let mean_stress = d.mean_stress().unwrap();
        assert!(d.tke > 0.0);
        assert!((d.tke - mean_stress.half_trace()).abs() < 1e-15);
        let m = mean_stress.to_matrix();
        assert_eq!(m[0][1], m[1][0]);
        assert_eq!(m[1][2], m[2][1]);
        assert_eq!(m[0][2], m[2][0]);
        assert_eq!(m[2][2], mean_stress.ww);
    }

    #[test]
    fn test_masked_samples_propagate() {
        let t = vec![0.0, 1.0, 2.0, 3.0];
        let u = TimeSeries::new("u", t.clone(), vec![Some(1.0), None, Some(3.0), Some(2.0)]).unwrap();
        let v = TimeSeries::from_raw("v", t.clone(), vec![0.5, 0.1, -0.2, 0.0]).unwrap();
        let w = TimeSeries::from_raw("w", t, vec![0.0, 0.1, 0.0, -0.1]).unwrap();
        let d = decompose(&VelocityFrame::new(u, v, w).unwrap()).unwrap();
        assert!((d.mean.u - 2.0).abs() < 1e-12);
        assert!(d.fluctuation.u.values()[1].is_none());
        assert!(d.stress.uu.values()[1].is_none());
        assert!(d.stress.uv.values()[1].is_none());
        assert!(d.stress.wu.values()[1].is_none());
        assert!(d.stress.vw.values()[1].is_some());
    }

    #[test]
    fn test_fully_masked_channel_is_insufficient_data() {
        let t = vec![0.0, 1.0];
        let u = TimeSeries::from_raw("u", t.clone(), vec![1.0, 2.0]).unwrap();
        let v = TimeSeries::new("v", t.clone(), vec![None, None]).unwrap();
        let w = TimeSeries::from_raw("w", t, vec![0.0, 0.0]).unwrap();
        let err = decompose(&VelocityFrame::new(u, v, w).unwrap()).unwrap_err();
        assert!(matches!(err, AdvError::InsufficientData { channel } if channel == "v"));
    }

    #[test]
    fn test_rms_and_intensity() {
        let d = decompose(&frame(&[1.0, 3.0], &[0.0, 0.0], &[0.0, 0.0])).unwrap();
        let rms = d.rms().unwrap();
        assert!((rms.u - 1.0).abs() < 1e-12);
        assert_eq!(rms.v, 0.0);
        let ti = d.turbulence_intensity().unwrap().unwrap();
        assert!((ti.u - 0.5).abs() < 1e-12);

        let still = decompose(&frame(&[1.0, -1.0], &[0.0, 0.0], &[0.0, 0.0])).unwrap();
        assert!(still.turbulence_intensity().unwrap().is_none());
    }

    #[test]
    fn test_reynolds_stress_sign_and_scale() {
        let d = decompose(&sample_frame()).unwrap();
        let mean = d.mean_stress().unwrap();
        let tau = d.reynolds_stress(1000.0).unwrap();
        assert!((tau.uv + 1000.0 * mean.uv).abs() < 1e-12);
        assert!(tau.uu <= 0.0);
    }

    #[test]
    fn test_ensure_aligned() {
        let a = TimeSeries::from_raw("a", vec![0.0, 1.0], vec![1.0, 2.0]).unwrap();
        let b = TimeSeries::from_raw("b", vec![0.0, 1.0], vec![3.0, 4.0]).unwrap();
        let c = TimeSeries::from_raw("c", vec![0.0, 2.0], vec![3.0, 4.0]).unwrap();
        assert!(ensure_aligned([&a, &b]).is_ok());
        assert!(matches!(ensure_aligned([&a, &b, &c]), Err(AdvError::Alignment(_))));
    }
}
