// Sensor kind domain model
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Temperature,
    Humidity,
    Pressure,
    Light,
    Sound,
    Other(String),
}

impl SensorKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "temperature" => Self::Temperature,
            "humidity" => Self::Humidity,
            "pressure" => Self::Pressure,
            "light" => Self::Light,
            "sound" => Self::Sound,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Pressure => "pressure",
            Self::Light => "light",
            Self::Sound => "sound",
            Self::Other(other) => other,
        }
    }

    /// Only these kinds have a prediction model behind `/last_prediction`.
    pub fn is_predictable(&self) -> bool {
        matches!(self, Self::Temperature | Self::Humidity | Self::Pressure)
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self {
            Self::Temperature => Some("°C"),
            Self::Humidity => Some("%"),
            Self::Pressure => Some("hPa"),
            Self::Light => Some("lx"),
            Self::Sound => Some("dB"),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SensorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
