// Chart view state machine, free of I/O
//
// Every operation that needs data returns a `FetchPlan` whose requests carry
// tickets. Results are applied with the ticket they were issued under; a
// ticket that is no longer the latest for its series is dropped.
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::chart::{AxisBounds, ChartFrame, Notice, Trace, TraceStyle, Viewport};
use crate::domain::error::ChartError;
use crate::domain::granularity::GranularityUnit;
use crate::domain::sensor::SensorKind;
use crate::domain::telemetry::{SensorSeries, TimeRange, TimeSeriesPoint, downsample_points};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredRequest {
    pub ticket: Ticket,
    pub kind: SensorKind,
    pub range: TimeRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictedRequest {
    pub ticket: Ticket,
    pub kind: SensorKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchPlan {
    pub measured: Option<MeasuredRequest>,
    pub predicted: Option<PredictedRequest>,
}

impl FetchPlan {
    pub fn is_empty(&self) -> bool {
        self.measured.is_none() && self.predicted.is_none()
    }
}

/// Sequence numbers for one series.
#[derive(Debug, Default)]
struct FetchSlot {
    issued: u64,
    pending: bool,
}

impl FetchSlot {
    fn begin(&mut self) -> Ticket {
        self.issued += 1;
        self.pending = true;
        Ticket(self.issued)
    }

    /// Supersedes whatever is in flight without starting a new fetch.
    fn invalidate(&mut self) {
        self.issued += 1;
        self.pending = false;
    }

    fn complete(&mut self, ticket: Ticket) -> bool {
        if ticket.0 != self.issued {
            return false;
        }
        self.pending = false;
        true
    }
}

#[derive(Debug)]
pub struct ChartState {
    room: String,
    available: Vec<SensorKind>,
    series: Option<SensorSeries>,
    range: TimeRange,
    /// Set by pan/zoom; otherwise the view fits the data.
    zoom: Option<Viewport>,
    measured_slot: FetchSlot,
    predicted_slot: FetchSlot,
    failure: Option<String>,
}

impl ChartState {
    pub fn new(room: impl Into<String>, range: TimeRange) -> Self {
        Self {
            room: room.into(),
            available: Vec::new(),
            series: None,
            range,
            zoom: None,
            measured_slot: FetchSlot::default(),
            predicted_slot: FetchSlot::default(),
            failure: None,
        }
    }

    #[cfg(test)]
    pub fn range(&self) -> TimeRange {
        self.range
    }

    /// Visible window: the pan/zoom window if any, else the extent of the
    /// fetched data, else the requested range.
    pub fn viewport(&self) -> Viewport {
        if let Some(zoom) = self.zoom {
            return zoom;
        }
        self.series
            .as_ref()
            .and_then(SensorSeries::extent)
            .map_or_else(|| Viewport::from(self.range), |(min, max)| Viewport { min, max })
    }

    pub fn available(&self) -> &[SensorKind] {
        &self.available
    }

    #[cfg(test)]
    pub fn series(&self) -> Option<&SensorSeries> {
        self.series.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.measured_slot.pending || self.predicted_slot.pending
    }

    pub fn set_available(&mut self, kinds: Vec<SensorKind>) {
        self.available = kinds;
    }

    pub fn select_sensor_kind(&mut self, kind: SensorKind) -> Result<FetchPlan, ChartError> {
        if !self.available.contains(&kind) {
            return Err(ChartError::UnknownSensorKind(kind.to_string()));
        }

        self.series = Some(SensorSeries::new(kind.clone()));
        self.failure = None;

        let measured = Some(self.begin_measured(kind.clone()));
        let predicted = if kind.is_predictable() {
            Some(self.begin_predicted(kind))
        } else {
            self.predicted_slot.invalidate();
            None
        };
        Ok(FetchPlan {
            measured,
            predicted,
        })
    }

    pub fn set_range(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<FetchPlan, ChartError> {
        let range = TimeRange::new(from, to)?;
        Ok(self.replace_range(range))
    }

    pub fn apply_preset(
        &mut self,
        hours_back: u32,
        now: DateTime<Utc>,
    ) -> Result<FetchPlan, ChartError> {
        let range = TimeRange::last_hours(now, hours_back)?;
        Ok(self.replace_range(range))
    }

    fn replace_range(&mut self, range: TimeRange) -> FetchPlan {
        debug!(room = %self.room, width = %range.width(), "time range changed");
        self.range = range;
        self.zoom = None;

        let Some(kind) = self.selected_kind() else {
            return FetchPlan::default();
        };
        self.failure = None;
        FetchPlan {
            measured: Some(self.begin_measured(kind)),
            predicted: None,
        }
    }

    /// Display-only: updates the axis unit, never plans a fetch.
    pub fn on_viewport_change(
        &mut self,
        min: DateTime<Utc>,
        max: DateTime<Utc>,
    ) -> Result<GranularityUnit, ChartError> {
        if min > max {
            return Err(ChartError::InvalidViewport { min, max });
        }
        let viewport = Viewport { min, max };
        self.zoom = Some(viewport);
        Ok(viewport.granularity())
    }

    pub fn reset_zoom(&mut self) -> GranularityUnit {
        self.zoom = None;
        self.viewport().granularity()
    }

    /// Re-issues the current fetch pattern.
    pub fn refresh(&mut self) -> FetchPlan {
        let Some(kind) = self.selected_kind() else {
            return FetchPlan::default();
        };
        self.failure = None;
        let predicted = kind
            .is_predictable()
            .then(|| self.begin_predicted(kind.clone()));
        FetchPlan {
            measured: Some(self.begin_measured(kind)),
            predicted,
        }
    }

    /// Returns `false` when the result is stale and was dropped.
    pub fn apply_measured(
        &mut self,
        ticket: Ticket,
        result: anyhow::Result<Vec<TimeSeriesPoint>>,
    ) -> bool {
        if !self.measured_slot.complete(ticket) {
            debug!(room = %self.room, ?ticket, "dropping stale historical data");
            return false;
        }
        match (result, self.series.as_mut()) {
            (Ok(points), Some(series)) => series.measured = points,
            (Ok(_), None) => {}
            (Err(e), _) => self.failure = Some(format!("{e:#}")),
        }
        true
    }

    /// Returns `false` when the result is stale and was dropped.
    pub fn apply_predicted(
        &mut self,
        ticket: Ticket,
        result: anyhow::Result<Vec<TimeSeriesPoint>>,
    ) -> bool {
        if !self.predicted_slot.complete(ticket) {
            debug!(room = %self.room, ?ticket, "dropping stale prediction");
            return false;
        }
        match (result, self.series.as_mut()) {
            (Ok(points), Some(series)) => series.predicted = points,
            (Ok(_), None) => {}
            (Err(e), _) => self.failure = Some(format!("{e:#}")),
        }
        true
    }

    pub fn frame(&self, max_points: usize) -> ChartFrame {
        let kind = self.selected_kind();
        let viewport = self.viewport();
        let granularity = viewport.granularity();

        let mut traces = Vec::new();
        let mut y_axis = None;
        if let Some(series) = &self.series {
            if !series.measured.is_empty() {
                traces.push(Trace {
                    id: "measured",
                    name: format!("{} (measured)", series.kind),
                    style: TraceStyle::Solid,
                    points: downsample_points(&series.measured, max_points),
                });
            }
            if !series.predicted.is_empty() {
                traces.push(Trace {
                    id: "predicted",
                    name: format!("{} (predicted)", series.kind),
                    style: TraceStyle::Dashed,
                    points: downsample_points(&series.predicted, max_points),
                });
            }
            y_axis = AxisBounds::padded(series.values());
        }

        let notice = if self.is_loading() {
            Some(Notice::Loading)
        } else if let Some(failure) = &self.failure {
            Some(Notice::NetworkFailure(failure.clone()))
        } else if self.series.as_ref().is_some_and(SensorSeries::is_empty) {
            Some(Notice::NoData)
        } else {
            None
        };

        ChartFrame {
            room: self.room.clone(),
            unit: kind.as_ref().and_then(SensorKind::unit),
            sensor: kind,
            range: self.range,
            viewport,
            granularity,
            tick_format: granularity.tick_format(),
            y_axis,
            traces,
            loading: self.is_loading(),
            notice,
        }
    }

    fn selected_kind(&self) -> Option<SensorKind> {
        self.series.as_ref().map(|series| series.kind.clone())
    }

    fn begin_measured(&mut self, kind: SensorKind) -> MeasuredRequest {
        MeasuredRequest {
            ticket: self.measured_slot.begin(),
            kind,
            range: self.range,
        }
    }

    fn begin_predicted(&mut self, kind: SensorKind) -> PredictedRequest {
        PredictedRequest {
            ticket: self.predicted_slot.begin(),
            kind,
        }
    }
}
