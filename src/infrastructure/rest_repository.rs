// REST repository implementation over the data and prediction services
use crate::application::sensor_repository::SensorDataSource;
use crate::domain::sensor::SensorKind;
use crate::domain::session::Session;
use crate::domain::telemetry::{TimeRange, TimeSeriesPoint};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RestSensorSource {
    client: reqwest::Client,
    data_url: String,
    prediction_url: String,
    session: Session,
    naive_timezone: Tz,
}

/// One reading as returned by `/historical_data` and `/last_prediction`.
/// Other fields of the payload (`id`, `device_id`, `location`, ...) are ignored.
#[derive(Debug, Deserialize)]
struct DataResponse {
    timestamp: String,
    value: f64,
}

/// Accepts RFC 3339 and offset-less timestamps, the latter read as wall-clock
/// time in `zone`. Ambiguous times take the earlier instant; times skipped by a
/// DST jump are shifted forward by an hour.
fn parse_timestamp(raw: &str, zone: Tz) -> Result<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(time.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .with_context(|| format!("Unrecognised timestamp {raw:?}"))?;
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
        .map(|local| local.with_timezone(&Utc))
        .with_context(|| format!("Timestamp {raw:?} does not exist in {zone}"))
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl RestSensorSource {
    pub fn new(
        data_url: String,
        prediction_url: String,
        timeout: Duration,
        session: Session,
        naive_timezone: Tz,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            data_url: data_url.trim_end_matches('/').to_string(),
            prediction_url: prediction_url.trim_end_matches('/').to_string(),
            session,
            naive_timezone,
        })
    }

    fn available_sensors_url(&self, room: &str) -> String {
        format!(
            "{}/available_sensors?location={}",
            self.data_url,
            urlencoding::encode(room)
        )
    }

    fn historical_data_url(&self, room: &str, kind: &SensorKind, range: TimeRange) -> String {
        format!(
            "{}/historical_data?location={}&sensor_type={}&from_date={}&to_date={}",
            self.data_url,
            urlencoding::encode(room),
            urlencoding::encode(kind.as_str()),
            urlencoding::encode(&format_instant(range.from())),
            urlencoding::encode(&format_instant(range.to())),
        )
    }

    fn last_prediction_url(&self, room: &str, kind: &SensorKind) -> String {
        format!(
            "{}/last_prediction?location={}&sensor_type={}",
            self.prediction_url,
            urlencoding::encode(room),
            urlencoding::encode(kind.as_str()),
        )
    }

    async fn execute_get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url).header("Accept", "application/json");
        if let Some(bearer) = self.session.bearer() {
            request = request.header("Authorization", bearer);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {url}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("GET {} failed with status {}: {}", url, status, body);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {url}"))
    }

    async fn fetch_points(&self, url: &str) -> Result<Vec<TimeSeriesPoint>> {
        let mut points = self
            .execute_get::<Vec<DataResponse>>(url)
            .await?
            .into_iter()
            .map(|r| {
                let timestamp = parse_timestamp(&r.timestamp, self.naive_timezone)?;
                Ok(TimeSeriesPoint::new(timestamp, r.value))
            })
            .collect::<Result<Vec<_>>>()?;
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }
}

#[async_trait]
impl SensorDataSource for RestSensorSource {
    async fn available_sensors(&self, room: &str) -> Result<Vec<SensorKind>> {
        let kinds: Vec<String> = self.execute_get(&self.available_sensors_url(room)).await?;
        Ok(kinds.iter().map(|k| SensorKind::parse(k)).collect())
    }

    async fn historical_data(
        &self,
        room: &str,
        kind: &SensorKind,
        range: TimeRange,
    ) -> Result<Vec<TimeSeriesPoint>> {
        self.fetch_points(&self.historical_data_url(room, kind, range))
            .await
    }

    async fn last_prediction(&self, room: &str, kind: &SensorKind) -> Result<Vec<TimeSeriesPoint>> {
        self.fetch_points(&self.last_prediction_url(room, kind)).await
    }
}
