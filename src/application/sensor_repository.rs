// Repository trait for sensor data access
use crate::domain::sensor::SensorKind;
use crate::domain::telemetry::{TimeRange, TimeSeriesPoint};
use async_trait::async_trait;

#[async_trait]
pub trait SensorDataSource: Send + Sync {
    /// Sensor kinds reported for a room
    async fn available_sensors(&self, room: &str) -> anyhow::Result<Vec<SensorKind>>;

    /// Measured readings inside `range`, ordered by timestamp
    async fn historical_data(
        &self,
        room: &str,
        kind: &SensorKind,
        range: TimeRange,
    ) -> anyhow::Result<Vec<TimeSeriesPoint>>;

    /// Latest forecast for a predictable kind, ordered by timestamp
    async fn last_prediction(
        &self,
        room: &str,
        kind: &SensorKind,
    ) -> anyhow::Result<Vec<TimeSeriesPoint>>;
}
