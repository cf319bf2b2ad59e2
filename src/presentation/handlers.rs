// HTTP request handlers
use crate::domain::chart::ChartFrame;
use crate::domain::error::ChartError;
use crate::domain::sensor::SensorKind;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

pub struct ApiError(ChartError);

impl From<ChartError> for ApiError {
    fn from(error: ChartError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ChartError::UnknownRoom(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, self.0.to_string()).into_response()
    }
}

type FrameResult = Result<Json<ChartFrame>, ApiError>;

#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ViewportQuery {
    pub min: DateTime<Utc>,
    pub max: DateTime<Utc>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.views.keys().cloned().collect())
}

/// Sensor kinds last loaded for the room
pub async fn list_sensors(
    Path(room): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SensorKind>>, ApiError> {
    let view = state.view(&room)?;
    Ok(Json(view.available_sensors().await))
}

/// Latest published frame; does not wait for in-flight fetches.
pub async fn get_chart(Path(room): Path<String>, State(state): State<Arc<AppState>>) -> FrameResult {
    let frame = state.view(&room)?.subscribe().borrow().clone();
    Ok(Json(frame))
}

pub async fn select_sensor(
    Path((room, kind)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> FrameResult {
    let view = state.view(&room)?;
    Ok(Json(view.select_sensor_kind(SensorKind::parse(&kind)).await?))
}

pub async fn set_range(
    Path(room): Path<String>,
    Query(query): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> FrameResult {
    let view = state.view(&room)?;
    Ok(Json(view.set_range(query.from, query.to).await?))
}

pub async fn apply_preset(
    Path((room, hours)): Path<(String, u32)>,
    State(state): State<Arc<AppState>>,
) -> FrameResult {
    let view = state.view(&room)?;
    Ok(Json(view.apply_preset(hours).await?))
}

pub async fn change_viewport(
    Path(room): Path<String>,
    Query(query): Query<ViewportQuery>,
    State(state): State<Arc<AppState>>,
) -> FrameResult {
    let view = state.view(&room)?;
    Ok(Json(view.on_viewport_change(query.min, query.max).await?))
}

pub async fn reset_zoom(Path(room): Path<String>, State(state): State<Arc<AppState>>) -> FrameResult {
    let view = state.view(&room)?;
    Ok(Json(view.reset_zoom().await))
}
