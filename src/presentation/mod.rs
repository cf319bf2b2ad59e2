// Presentation layer - HTTP surface over the chart views
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    apply_preset, change_viewport, get_chart, health_check, list_rooms, list_sensors, reset_zoom,
    select_sensor, set_range,
};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/rooms", get(list_rooms))
        .route("/rooms/:room/sensors", get(list_sensors))
        .route("/rooms/:room/chart", get(get_chart))
        .route("/rooms/:room/sensor/:kind", post(select_sensor))
        .route("/rooms/:room/range", post(set_range))
        .route("/rooms/:room/preset/:hours", post(apply_preset))
        .route("/rooms/:room/viewport", post(change_viewport))
        .route("/rooms/:room/reset_zoom", post(reset_zoom))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::chart_service::tests::{FixedClock, lab1_source, now};
    use crate::application::chart_service::{ChartView, MAX_POINTS_PER_SERIES};
    use serde_json::Value;

    async fn serve_lab1() -> String {
        let view = Arc::new(ChartView::new(
            "Lab1",
            Arc::new(lab1_source()),
            Arc::new(FixedClock(now())),
            24,
            MAX_POINTS_PER_SERIES,
        )
        .unwrap());
        view.load_available_sensors().await;
        let state = Arc::new(AppState::new([view]));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router(state)).await.unwrap() });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_drive_chart_over_http() {
        let base = serve_lab1().await;
        let client = reqwest::Client::new();

        let rooms: Vec<String> = client
            .get(format!("{base}/rooms"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(rooms, vec!["Lab1".to_string()]);

        let frame: Value = client
            .post(format!("{base}/rooms/Lab1/sensor/temperature"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(frame["sensor"], "temperature");
        assert_eq!(frame["traces"].as_array().unwrap().len(), 2);
        assert_eq!(frame["traces"][1]["style"], "dashed");

        let frame: Value = client
            .post(format!(
                "{base}/rooms/Lab1/viewport?min=2024-01-18T11:59:30Z&max=2024-01-18T12:00:00Z"
            ))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(frame["granularity"], "second");

        let frame: Value = client
            .get(format!("{base}/rooms/Lab1/chart"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(frame["granularity"], "second");
        assert_eq!(frame["loading"], false);
    }

    #[tokio::test]
    async fn test_rejections() {
        let base = serve_lab1().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/rooms/Lab1/sensor/sound"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let response = client
            .post(format!(
                "{base}/rooms/Lab1/range?from=2024-01-18T12:00:00Z&to=2024-01-18T10:00:00Z"
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let response = client
            .post(format!("{base}/rooms/Lab1/preset/{}", u32::MAX))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let response = client
            .get(format!("{base}/rooms/Attic/chart"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
