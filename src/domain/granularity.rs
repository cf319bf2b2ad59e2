// Time-axis granularity derived from the visible window
use chrono::TimeDelta;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GranularityUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl GranularityUnit {
    /// Pure function of the span width.
    pub fn for_span(span: TimeDelta) -> Self {
        if span < TimeDelta::minutes(1) {
            Self::Second
        } else if span < TimeDelta::hours(1) {
            Self::Minute
        } else if span < TimeDelta::days(1) {
            Self::Hour
        } else {
            Self::Day
        }
    }

    /// `chrono` strftime pattern for tick labels.
    pub fn tick_format(self) -> &'static str {
        match self {
            Self::Second => "%H:%M:%S",
            Self::Minute => "%H:%M",
            Self::Hour => "%d %b %H:00",
            Self::Day => "%Y-%m-%d",
        }
    }
}
