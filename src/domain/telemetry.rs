// Telemetry data domain models
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::error::ChartError;
use super::sensor::SensorKind;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Closed time window, `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, ChartError> {
        if from > to {
            return Err(ChartError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// The `hours_back` hours ending at `now`.
    pub fn last_hours(now: DateTime<Utc>, hours_back: u32) -> Result<Self, ChartError> {
        let from = now
            .checked_sub_signed(TimeDelta::hours(i64::from(hours_back)))
            .ok_or(ChartError::PresetOutOfRange(hours_back))?;
        Ok(Self { from, to: now })
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    pub fn width(&self) -> TimeDelta {
        self.to - self.from
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorSeries {
    pub kind: SensorKind,
    pub measured: Vec<TimeSeriesPoint>,
    pub predicted: Vec<TimeSeriesPoint>,
}

impl SensorSeries {
    pub fn new(kind: SensorKind) -> Self {
        Self {
            kind,
            measured: Vec::new(),
            predicted: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.measured.is_empty() && self.predicted.is_empty()
    }

    /// Earliest and latest timestamp across both series.
    pub fn extent(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let timestamps = self.measured.iter().chain(self.predicted.iter()).map(|p| p.timestamp);
        let min = timestamps.clone().min()?;
        let max = timestamps.max()?;
        Some((min, max))
    }

    /// Values of both series, measured first.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.measured
            .iter()
            .chain(self.predicted.iter())
            .map(|p| p.value)
    }
}

/// Downsample time series points using bucket averaging
pub fn downsample_points(points: &[TimeSeriesPoint], max_points: usize) -> Vec<TimeSeriesPoint> {
    if max_points == 0 || points.len() <= max_points {
        return points.to_vec();
    }

    let bucket_size = points.len().div_ceil(max_points);
    points
        .chunks(bucket_size)
        .map(|chunk| {
            // Middle point's timestamp, average value
            let avg_value = chunk.iter().map(|p| p.value).sum::<f64>() / chunk.len() as f64;
            TimeSeriesPoint::new(chunk[chunk.len() / 2].timestamp, avg_value)
        })
        .collect()
}
