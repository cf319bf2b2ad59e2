// Chart view service - Drives one room's chart state against the data source
use crate::application::chart_state::{ChartState, FetchPlan};
use crate::application::clock::Clock;
use crate::application::sensor_repository::SensorDataSource;
use crate::domain::chart::ChartFrame;
use crate::domain::error::ChartError;
use crate::domain::granularity::GranularityUnit;
use crate::domain::sensor::SensorKind;
use crate::domain::telemetry::TimeRange;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

pub const MAX_POINTS_PER_SERIES: usize = 150;

pub struct ChartView {
    room: String,
    source: Arc<dyn SensorDataSource>,
    clock: Arc<dyn Clock>,
    max_points: usize,
    state: Mutex<ChartState>,
    frames: watch::Sender<ChartFrame>,
}

impl ChartView {
    pub fn new(
        room: impl Into<String>,
        source: Arc<dyn SensorDataSource>,
        clock: Arc<dyn Clock>,
        preset_hours: u32,
        max_points: usize,
    ) -> Result<Self, ChartError> {
        let room = room.into();
        let range = TimeRange::last_hours(clock.now(), preset_hours)?;
        let state = ChartState::new(room.clone(), range);
        let (frames, _) = watch::channel(state.frame(max_points));
        Ok(Self {
            room,
            source,
            clock,
            max_points,
            state: Mutex::new(state),
            frames,
        })
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    /// Latest frame, updated after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ChartFrame> {
        self.frames.subscribe()
    }

    pub async fn available_sensors(&self) -> Vec<SensorKind> {
        self.state.lock().await.available().to_vec()
    }

    pub async fn load_available_sensors(&self) -> Vec<SensorKind> {
        match self.source.available_sensors(&self.room).await {
            Ok(kinds) => {
                info!(room = %self.room, count = kinds.len(), "loaded available sensors");
                let mut state = self.state.lock().await;
                state.set_available(kinds.clone());
                kinds
            }
            Err(e) => {
                warn!(room = %self.room, "failed to load available sensors: {e:#}");
                self.available_sensors().await
            }
        }
    }

    pub async fn select_sensor_kind(&self, kind: SensorKind) -> Result<ChartFrame, ChartError> {
        let plan = self.state.lock().await.select_sensor_kind(kind)?;
        Ok(self.execute(plan).await)
    }

    pub async fn set_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ChartFrame, ChartError> {
        let plan = self.state.lock().await.set_range(from, to)?;
        Ok(self.execute(plan).await)
    }

    pub async fn apply_preset(&self, hours_back: u32) -> Result<ChartFrame, ChartError> {
        let now = self.clock.now();
        let plan = self.state.lock().await.apply_preset(hours_back, now)?;
        Ok(self.execute(plan).await)
    }

    pub async fn on_viewport_change(
        &self,
        min: DateTime<Utc>,
        max: DateTime<Utc>,
    ) -> Result<ChartFrame, ChartError> {
        let mut state = self.state.lock().await;
        let unit: GranularityUnit = state.on_viewport_change(min, max)?;
        debug!(room = %self.room, ?unit, "viewport changed");
        Ok(self.publish(&state))
    }

    pub async fn reset_zoom(&self) -> ChartFrame {
        let mut state = self.state.lock().await;
        state.reset_zoom();
        self.publish(&state)
    }

    pub async fn refresh(&self) -> ChartFrame {
        let plan = self.state.lock().await.refresh();
        self.execute(plan).await
    }

    /// Runs the planned fetches without holding the state lock.
    async fn execute(&self, plan: FetchPlan) -> ChartFrame {
        if plan.is_empty() {
            return self.publish(&*self.state.lock().await);
        }
        self.publish(&*self.state.lock().await);

        let measured = async {
            match &plan.measured {
                Some(request) => Some(
                    self.source
                        .historical_data(&self.room, &request.kind, request.range)
                        .await,
                ),
                None => None,
            }
        };
        let predicted = async {
            match &plan.predicted {
                Some(request) => Some(self.source.last_prediction(&self.room, &request.kind).await),
                None => None,
            }
        };
        let (measured, predicted) = tokio::join!(measured, predicted);

        let mut state = self.state.lock().await;
        if let (Some(request), Some(result)) = (&plan.measured, measured) {
            match &result {
                Ok(points) => debug!(room = %self.room, kind = %request.kind, points = points.len(), "historical data received"),
                Err(e) => warn!(room = %self.room, kind = %request.kind, "historical data fetch failed: {e:#}"),
            }
            state.apply_measured(request.ticket, result);
        }
        if let (Some(request), Some(result)) = (&plan.predicted, predicted) {
            match &result {
                Ok(points) => debug!(room = %self.room, kind = %request.kind, points = points.len(), "prediction received"),
                Err(e) => warn!(room = %self.room, kind = %request.kind, "prediction fetch failed: {e:#}"),
            }
            state.apply_predicted(request.ticket, result);
        }
        self.publish(&state)
    }

    fn publish(&self, state: &ChartState) -> ChartFrame {
        let frame = state.frame(self.max_points);
        self.frames.send_replace(frame.clone());
        frame
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::chart::{Notice, TraceStyle};
    use crate::domain::telemetry::TimeSeriesPoint;
    use async_trait::async_trait;
    use chrono::{TimeDelta, TimeZone};
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub struct FixedClock(pub DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// In-memory source that records the calls made against it.
    #[derive(Default)]
    pub struct FakeSource {
        pub sensors: Vec<SensorKind>,
        pub historical: StdMutex<Vec<TimeSeriesPoint>>,
        pub prediction: Vec<TimeSeriesPoint>,
        pub fail_historical: std::sync::atomic::AtomicBool,
        pub historical_calls: AtomicUsize,
        pub prediction_calls: AtomicUsize,
        pub ranges: StdMutex<Vec<TimeRange>>,
    }

    #[async_trait]
    impl SensorDataSource for FakeSource {
        async fn available_sensors(&self, _room: &str) -> anyhow::Result<Vec<SensorKind>> {
            Ok(self.sensors.clone())
        }

        async fn historical_data(
            &self,
            _room: &str,
            _kind: &SensorKind,
            range: TimeRange,
        ) -> anyhow::Result<Vec<TimeSeriesPoint>> {
            self.historical_calls.fetch_add(1, Ordering::SeqCst);
            self.ranges.lock().unwrap().push(range);
            if self.fail_historical.load(Ordering::SeqCst) {
                anyhow::bail!("historical_data rejected");
            }
            Ok(self.historical.lock().unwrap().clone())
        }

        async fn last_prediction(
            &self,
            _room: &str,
            _kind: &SensorKind,
        ) -> anyhow::Result<Vec<TimeSeriesPoint>> {
            self.prediction_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.prediction.clone())
        }
    }

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 18, 12, 0, 0).unwrap()
    }

    pub fn lab1_source() -> FakeSource {
        let historical = (0..3)
            .map(|i| TimeSeriesPoint::new(now() - TimeDelta::hours(2 - i), 21.0 + i as f64))
            .collect();
        FakeSource {
            sensors: vec![SensorKind::Temperature, SensorKind::Light],
            historical: StdMutex::new(historical),
            prediction: vec![TimeSeriesPoint::new(now() + TimeDelta::hours(1), 24.5)],
            ..FakeSource::default()
        }
    }

    fn view(source: Arc<FakeSource>) -> ChartView {
        ChartView::new("Lab1", source, Arc::new(FixedClock(now())), 24, MAX_POINTS_PER_SERIES)
            .unwrap()
    }

    #[tokio::test]
    async fn test_lab1_temperature_renders_two_traces() {
        let source = Arc::new(lab1_source());
        let view = view(source.clone());
        view.load_available_sensors().await;

        view.select_sensor_kind(SensorKind::Temperature).await.unwrap();
        let frame = view
            .set_range(now() - TimeDelta::hours(2), now())
            .await
            .unwrap();

        assert_eq!(frame.granularity, GranularityUnit::Hour);
        assert_eq!(frame.traces.len(), 2);
        assert_eq!(frame.traces[0].points.len(), 3);
        assert_eq!(frame.traces[1].style, TraceStyle::Dashed);
        assert!(!frame.loading);
        assert_eq!(*view.subscribe().borrow(), frame);
    }

    #[tokio::test]
    async fn test_lab1_default_view_resolves_hour() {
        let source = Arc::new(lab1_source());
        let view = view(source.clone());
        view.load_available_sensors().await;

        let frame = view.select_sensor_kind(SensorKind::Temperature).await.unwrap();

        assert_eq!(frame.range.width(), TimeDelta::hours(24));
        assert_eq!(frame.granularity, GranularityUnit::Hour);
        assert_eq!(frame.traces.len(), 2);
        assert_eq!(frame.traces[0].points.len(), 3);
        assert_eq!(frame.traces[1].points.len(), 1);
    }

    #[tokio::test]
    async fn test_unrepresentable_preset_is_rejected() {
        let source = Arc::new(lab1_source());
        let view = view(source.clone());
        view.load_available_sensors().await;
        let before = view.select_sensor_kind(SensorKind::Temperature).await.unwrap();

        let err = view.apply_preset(u32::MAX).await.unwrap_err();
        assert_eq!(err, ChartError::PresetOutOfRange(u32::MAX));
        assert_eq!(source.historical_calls.load(Ordering::SeqCst), 1);
        assert_eq!(*view.subscribe().borrow(), before);
    }

    #[tokio::test]
    async fn test_unpredictable_kind_never_fetches_prediction() {
        let source = Arc::new(lab1_source());
        let view = view(source.clone());
        view.load_available_sensors().await;

        let frame = view.select_sensor_kind(SensorKind::Light).await.unwrap();
        assert_eq!(frame.traces.len(), 1);
        assert_eq!(source.prediction_calls.load(Ordering::SeqCst), 0);

        view.refresh().await;
        assert_eq!(source.prediction_calls.load(Ordering::SeqCst), 0);
        assert_eq!(source.historical_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_kind_is_rejected() {
        let source = Arc::new(lab1_source());
        let view = view(source.clone());
        view.load_available_sensors().await;

        let err = view.select_sensor_kind(SensorKind::Sound).await.unwrap_err();
        assert_eq!(err, ChartError::UnknownSensorKind("sound".to_string()));
        assert_eq!(source.historical_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejected_fetch_keeps_previous_series() {
        let source = Arc::new(lab1_source());
        let view = view(source.clone());
        view.load_available_sensors().await;
        let before = view.select_sensor_kind(SensorKind::Temperature).await.unwrap();

        source.fail_historical.store(true, Ordering::SeqCst);
        let after = view
            .set_range(now() - TimeDelta::hours(6), now())
            .await
            .unwrap();

        assert!(!after.loading);
        assert_eq!(after.traces, before.traces);
        assert!(matches!(after.notice, Some(Notice::NetworkFailure(_))));
    }

    #[tokio::test]
    async fn test_week_preset_fetches_once() {
        let source = Arc::new(lab1_source());
        let view = view(source.clone());
        view.load_available_sensors().await;
        view.select_sensor_kind(SensorKind::Temperature).await.unwrap();
        let calls = source.historical_calls.load(Ordering::SeqCst);

        let frame = view.apply_preset(24 * 7).await.unwrap();

        assert_eq!(frame.range.from(), now() - TimeDelta::hours(168));
        assert_eq!(frame.range.to(), now());
        assert_eq!(source.historical_calls.load(Ordering::SeqCst), calls + 1);
        assert_eq!(source.ranges.lock().unwrap().last(), Some(&frame.range));
    }

    #[tokio::test]
    async fn test_viewport_change_does_not_fetch() {
        let source = Arc::new(lab1_source());
        let view = view(source.clone());
        view.load_available_sensors().await;
        view.select_sensor_kind(SensorKind::Temperature).await.unwrap();
        let calls = source.historical_calls.load(Ordering::SeqCst);

        let frame = view
            .on_viewport_change(now() - TimeDelta::seconds(30), now())
            .await
            .unwrap();
        assert_eq!(frame.granularity, GranularityUnit::Second);

        let frame = view.reset_zoom().await;
        assert_eq!(frame.granularity, GranularityUnit::Hour);
        assert_eq!(source.historical_calls.load(Ordering::SeqCst), calls);
        assert_eq!(source.prediction_calls.load(Ordering::SeqCst), 1);
    }
}
