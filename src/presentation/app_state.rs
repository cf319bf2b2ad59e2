// Application state for HTTP handlers
use crate::application::chart_service::ChartView;
use crate::domain::error::ChartError;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct AppState {
    pub views: BTreeMap<String, Arc<ChartView>>,
}

impl AppState {
    pub fn new(views: impl IntoIterator<Item = Arc<ChartView>>) -> Self {
        Self {
            views: views
                .into_iter()
                .map(|view| (view.room().to_string(), view))
                .collect(),
        }
    }

    pub fn view(&self, room: &str) -> Result<&Arc<ChartView>, ChartError> {
        self.views
            .get(room)
            .ok_or_else(|| ChartError::UnknownRoom(room.to_string()))
    }
}
