//! Measurement data types shared by the processing stages and the table adapters.
//!
//! A [`TimeSeries`] is one named scalar channel sampled at strictly increasing instants.
//! Masked samples are `None`. A [`VelocityFrame`] groups the three velocity components on a
//! single shared index; a [`BottomFrame`] is the instrument's (coarser) bottom-check record.

use crate::error::{AdvError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

/// One of the three orthogonal velocity components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Streamwise component (instrument `VelocityX`).
    U,
    /// Cross-stream component (instrument `VelocityY`).
    V,
    /// Vertical component (instrument `VelocityZ1`/`VelocityZ2`).
    W,
}

impl Channel {
    /// All channels in canonical order.
    pub const ALL: [Channel; 3] = [Channel::U, Channel::V, Channel::W];

    /// Canonical channel name.
    pub fn name(self) -> &'static str {
        match self {
            Channel::U => "u",
            Channel::V => "v",
            Channel::W => "w",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value for each velocity channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerChannel<T> {
    /// Streamwise entry.
    pub u: T,
    /// Cross-stream entry.
    pub v: T,
    /// Vertical entry.
    pub w: T,
}

impl<T> PerChannel<T> {
    /// Builds the record by evaluating `f` once per channel, in canonical order.
    pub fn from_fn(mut f: impl FnMut(Channel) -> T) -> Self {
        Self {
            u: f(Channel::U),
            v: f(Channel::V),
            w: f(Channel::W),
        }
    }

    /// Fallible variant of [`PerChannel::from_fn`]; stops at the first error.
    pub fn try_from_fn<E>(mut f: impl FnMut(Channel) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            u: f(Channel::U)?,
            v: f(Channel::V)?,
            w: f(Channel::W)?,
        })
    }

    /// Entry for one channel.
    pub fn get(&self, channel: Channel) -> &T {
        match channel {
            Channel::U => &self.u,
            Channel::V => &self.v,
            Channel::W => &self.w,
        }
    }

    /// Applies `f` to every entry.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> PerChannel<U> {
        PerChannel {
            u: f(&self.u),
            v: f(&self.v),
            w: f(&self.w),
        }
    }

    /// Iterates `(channel, entry)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &T)> {
        Channel::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

impl<T> Index<Channel> for PerChannel<T> {
    type Output = T;

    fn index(&self, channel: Channel) -> &T {
        self.get(channel)
    }
}

/// An ordered series of `(timestamp, value)` samples for one named scalar channel.
///
/// # Invariants
/// * `timestamps` and `values` have the same length.
/// * Timestamps are finite and strictly increasing (so no two rows share one).
/// * A masked or missing sample is `None`, never a placeholder number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSeries")]
pub struct TimeSeries {
    name: String,
    timestamps: Vec<f64>,
    values: Vec<Option<f64>>,
}

impl TimeSeries {
    /// Creates a series, validating the index.
    pub fn new(
        name: impl Into<String>,
        timestamps: Vec<f64>,
        values: Vec<Option<f64>>,
    ) -> AppResult<Self> {
        let name = name.into();
        if timestamps.len() != values.len() {
            return Err(AdvError::Alignment(format!(
                "series '{}' has {} timestamps but {} values",
                name,
                timestamps.len(),
                values.len()
            )));
        }
        validate_index(&name, &timestamps)?;
        Ok(Self {
            name,
            timestamps,
            values,
        })
    }

    /// Creates a series from raw instrument readings.
    ///
    /// Non-finite readings (NaN, infinities) are stored as masked samples.
    pub fn from_raw(
        name: impl Into<String>,
        timestamps: Vec<f64>,
        readings: Vec<f64>,
    ) -> AppResult<Self> {
        let values = readings
            .into_iter()
            .map(|x| x.is_finite().then_some(x))
            .collect();
        Self::new(name, timestamps, values)
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Timestamps in seconds.
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Sample values; `None` marks a masked sample.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Number of rows, masked ones included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` if the series has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates `(timestamp, value)` rows.
    pub fn iter(&self) -> impl Iterator<Item = (f64, Option<f64>)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }

    /// Iterates the unmasked values only.
    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }

    /// Number of unmasked samples.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Number of masked samples.
    pub fn masked_count(&self) -> usize {
        self.len() - self.valid_count()
    }

    /// `true` if both series are sampled at exactly the same instants.
    pub fn shares_index(&self, other: &TimeSeries) -> bool {
        self.timestamps == other.timestamps
    }

    /// Returns a copy under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> TimeSeries {
        TimeSeries {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Applies `f` to every unmasked value; masked samples stay masked.
    ///
    /// A non-finite result is masked as well.
    pub fn map_values(&self, name: impl Into<String>, f: impl Fn(f64) -> f64) -> TimeSeries {
        TimeSeries {
            name: name.into(),
            timestamps: self.timestamps.clone(),
            values: self
                .values
                .iter()
                .map(|v| v.map(&f).filter(|x| x.is_finite()))
                .collect(),
        }
    }

    /// Combines two series pointwise. Both must share the same index.
    ///
    /// A row is masked in the output if it is masked in either input.
    pub fn zip_with(
        &self,
        other: &TimeSeries,
        name: impl Into<String>,
        f: impl Fn(f64, f64) -> f64,
    ) -> AppResult<TimeSeries> {
        let name = name.into();
        if !self.shares_index(other) {
            return Err(AdvError::Alignment(format!(
                "cannot combine '{}' ({} rows) with '{}' ({} rows) into '{}': indices differ",
                self.name,
                self.len(),
                other.name,
                other.len(),
                name
            )));
        }
        let values = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => Some(f(*a, *b)),
                _ => None,
            })
            .collect();
        Ok(TimeSeries {
            name,
            timestamps: self.timestamps.clone(),
            values,
        })
    }

    /// Replaces the values while keeping name and index.
    pub(crate) fn with_values(&self, values: Vec<Option<f64>>) -> TimeSeries {
        debug_assert_eq!(values.len(), self.timestamps.len());
        TimeSeries {
            name: self.name.clone(),
            timestamps: self.timestamps.clone(),
            values,
        }
    }
}

/// Unchecked field layout of a serialized [`TimeSeries`].
#[derive(Deserialize)]
struct RawTimeSeries {
    name: String,
    timestamps: Vec<f64>,
    values: Vec<Option<f64>>,
}

impl TryFrom<RawTimeSeries> for TimeSeries {
    type Error = AdvError;

    fn try_from(raw: RawTimeSeries) -> AppResult<Self> {
        TimeSeries::new(raw.name, raw.timestamps, raw.values)
    }
}

fn validate_index(name: &str, timestamps: &[f64]) -> AppResult<()> {
    if let Some(pos) = timestamps.iter().position(|t| !t.is_finite()) {
        return Err(AdvError::InvalidIndex(format!(
            "series '{}' has a non-finite timestamp at row {}",
            name, pos
        )));
    }
    if let Some(pos) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
        return Err(AdvError::InvalidIndex(format!(
            "series '{}' timestamps are not strictly increasing at row {} ({} then {})",
            name,
            pos + 1,
            timestamps[pos],
            timestamps[pos + 1]
        )));
    }
    Ok(())
}

/// The three velocity components of one record, sampled on one shared index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVelocityFrame")]
pub struct VelocityFrame {
    channels: PerChannel<TimeSeries>,
}

#[derive(Deserialize)]
struct RawVelocityFrame {
    channels: PerChannel<TimeSeries>,
}

impl TryFrom<RawVelocityFrame> for VelocityFrame {
    type Error = AdvError;

    fn try_from(raw: RawVelocityFrame) -> AppResult<Self> {
        let PerChannel { u, v, w } = raw.channels;
        VelocityFrame::new(u, v, w)
    }
}

impl VelocityFrame {
    /// Groups three component series into a frame.
    ///
    /// Series are renamed to the canonical channel names. Fails with
    /// [`AdvError::Alignment`] if the indices differ.
    pub fn new(u: TimeSeries, v: TimeSeries, w: TimeSeries) -> AppResult<Self> {
        for other in [&v, &w] {
            if !u.shares_index(other) {
                return Err(AdvError::Alignment(format!(
                    "velocity channel '{}' ({} rows) is not sampled at the same instants as '{}' ({} rows)",
                    other.name(),
                    other.len(),
                    u.name(),
                    u.len()
                )));
            }
        }
        Ok(Self {
            channels: PerChannel {
                u: u.renamed(Channel::U.name()),
                v: v.renamed(Channel::V.name()),
                w: w.renamed(Channel::W.name()),
            },
        })
    }

    /// Builds a frame from a shared index and three raw reading columns.
    pub fn from_columns(
        timestamps: Vec<f64>,
        u: Vec<f64>,
        v: Vec<f64>,
        w: Vec<f64>,
    ) -> AppResult<Self> {
        Self::new(
            TimeSeries::from_raw(Channel::U.name(), timestamps.clone(), u)?,
            TimeSeries::from_raw(Channel::V.name(), timestamps.clone(), v)?,
            TimeSeries::from_raw(Channel::W.name(), timestamps, w)?,
        )
    }

    /// Series of one component.
    pub fn channel(&self, channel: Channel) -> &TimeSeries {
        self.channels.get(channel)
    }

    /// All three components.
    pub fn channels(&self) -> &PerChannel<TimeSeries> {
        &self.channels
    }

    /// Shared timestamp index.
    pub fn timestamps(&self) -> &[f64] {
        self.channels.u.timestamps()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.channels.u.len()
    }

    /// `true` if the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.channels.u.is_empty()
    }
}

/// Raw distance-to-bed readings from the instrument's bottom check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBottomFrame")]
pub struct BottomFrame {
    distance: TimeSeries,
}

#[derive(Deserialize)]
struct RawBottomFrame {
    distance: TimeSeries,
}

impl From<RawBottomFrame> for BottomFrame {
    fn from(raw: RawBottomFrame) -> Self {
        BottomFrame::new(raw.distance)
    }
}

impl BottomFrame {
    /// Canonical name of the distance channel.
    pub const CHANNEL: &'static str = "BottomDistance";

    /// Wraps a distance series.
    pub fn new(distance: TimeSeries) -> Self {
        Self {
            distance: distance.renamed(Self::CHANNEL),
        }
    }

    /// Builds a frame from raw columns.
    pub fn from_columns(timestamps: Vec<f64>, distance: Vec<f64>) -> AppResult<Self> {
        Ok(Self::new(TimeSeries::from_raw(
            Self::CHANNEL,
            timestamps,
            distance,
        )?))
    }

    /// The distance series.
    pub fn distance(&self) -> &TimeSeries {
        &self.distance
    }
}
