use chrono::{DateTime, Utc};
use thiserror::Error;

/// Operations rejected by a chart view. State is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("invalid range: {from} is after {to}")]
    InvalidRange { from: DateTime<Utc>, to: DateTime<Utc> },

    #[error("invalid viewport: {min} is after {max}")]
    InvalidViewport { min: DateTime<Utc>, max: DateTime<Utc> },

    #[error("preset of {0} hours reaches before the earliest representable time")]
    PresetOutOfRange(u32),

    #[error("sensor kind `{0}` is not available in this room")]
    UnknownSensorKind(String),

    #[error("unknown room `{0}`")]
    UnknownRoom(String),
}
