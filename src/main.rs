// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use futures::future::join_all;
use tracing_subscriber::EnvFilter;

use crate::application::chart_service::ChartView;
use crate::application::clock::SystemClock;
use crate::application::polling::Poller;
use crate::domain::sensor::SensorKind;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::rest_repository::RestSensorSource;
use crate::presentation::app_state::AppState;
use crate::presentation::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config().context("Failed to load config/chart")?;
    tracing::debug!(session = ?config.session, "loaded configuration");
    tracing::info!(
        user = config.session.display_label(),
        timezone = %config.services.naive_timezone,
        "session ready"
    );

    // Create data source (infrastructure layer)
    let source = Arc::new(RestSensorSource::new(
        config.services.data_url.clone(),
        config.services.prediction_url.clone(),
        config.services.timeout(),
        config.session.clone(),
        config.services.naive_timezone,
    )?);

    // Create one chart view per room (application layer)
    let views: Vec<Arc<ChartView>> = config
        .rooms
        .iter()
        .map(|room| {
            ChartView::new(
                room.name.clone(),
                source.clone(),
                Arc::new(SystemClock),
                config.chart.default_preset_hours,
                config.chart.max_points,
            )
            .map(Arc::new)
            .with_context(|| format!("Invalid chart settings for room {}", room.name))
        })
        .collect::<anyhow::Result<_>>()?;

    // Initial load: sensors, then the configured kind
    join_all(views.iter().zip(&config.rooms).map(|(view, room)| async move {
        let available = view.load_available_sensors().await;
        let Some(sensor) = &room.sensor else {
            return;
        };
        let kind = SensorKind::parse(sensor);
        if !available.contains(&kind) {
            tracing::warn!(room = %room.name, %kind, "configured sensor not available");
            return;
        }
        if let Err(e) = view.select_sensor_kind(kind).await {
            tracing::warn!(room = %room.name, "initial selection failed: {e}");
        }
    }))
    .await;

    // Pollers live as long as the server
    let _pollers: Vec<Poller> = match config.chart.poll_interval() {
        Some(interval) => views
            .iter()
            .map(|view| Poller::spawn(view.clone(), interval))
            .collect(),
        None => Vec::new(),
    };

    // Build router (presentation layer)
    let state = Arc::new(AppState::new(views));
    let router = router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting room-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
