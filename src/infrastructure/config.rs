use crate::domain::session::Session;
use chrono_tz::Tz;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub services: ServiceSettings,
    #[serde(default)]
    pub session: Session,
    #[serde(default)]
    pub chart: ChartSettings,
    #[serde(default)]
    pub rooms: Vec<RoomConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceSettings {
    /// Serves `/available_sensors` and `/historical_data`.
    pub data_url: String,
    /// Serves `/last_prediction`.
    pub prediction_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Zone of timestamps the services send without an offset.
    #[serde(default = "default_naive_timezone")]
    pub naive_timezone: Tz,
}

impl ServiceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartSettings {
    #[serde(default = "default_max_points")]
    pub max_points: usize,
    /// Zero disables polling.
    #[serde(default)]
    pub poll_interval_secs: u64,
    #[serde(default = "default_preset_hours")]
    pub default_preset_hours: u32,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
            poll_interval_secs: 0,
            default_preset_hours: default_preset_hours(),
        }
    }
}

impl ChartSettings {
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoomConfig {
    pub name: String,
    /// Sensor kind selected once the room's sensors are loaded.
    pub sensor: Option<String>,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_naive_timezone() -> Tz {
    chrono_tz::Europe::Bucharest
}

fn default_max_points() -> usize {
    crate::application::chart_service::MAX_POINTS_PER_SERIES
}

fn default_preset_hours() -> u32 {
    24
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/chart"))
        .add_source(
            config::Environment::with_prefix("ROOM_TELEMETRY")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
