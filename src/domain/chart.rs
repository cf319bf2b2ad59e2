// Chart render model
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::granularity::GranularityUnit;
use super::sensor::SensorKind;
use super::telemetry::{TimeRange, TimeSeriesPoint};

/// Fraction of the value range added above and below the traces.
pub const AXIS_PADDING_RATIO: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub id: &'static str,
    pub name: String,
    pub style: TraceStyle,
    pub points: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

impl AxisBounds {
    /// Bounds of `values` padded by [`AXIS_PADDING_RATIO`] of their range on each side.
    pub fn padded<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;
        let padding = (max - min) * AXIS_PADDING_RATIO;
        Some(Self {
            min: min - padding,
            max: max + padding,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Notice {
    Loading,
    NoData,
    NetworkFailure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub min: DateTime<Utc>,
    pub max: DateTime<Utc>,
}

impl From<TimeRange> for Viewport {
    fn from(range: TimeRange) -> Self {
        Self {
            min: range.from(),
            max: range.to(),
        }
    }
}

impl Viewport {
    pub fn granularity(&self) -> GranularityUnit {
        GranularityUnit::for_span(self.max - self.min)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrame {
    pub room: String,
    pub sensor: Option<SensorKind>,
    pub unit: Option<&'static str>,
    pub range: TimeRange,
    pub viewport: Viewport,
    pub granularity: GranularityUnit,
    pub tick_format: &'static str,
    pub y_axis: Option<AxisBounds>,
    pub traces: Vec<Trace>,
    pub loading: bool,
    pub notice: Option<Notice>,
}
