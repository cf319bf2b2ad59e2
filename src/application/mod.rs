// Application layer - Chart view use cases
pub mod chart_service;
pub mod chart_state;
pub mod clock;
pub mod polling;
pub mod sensor_repository;
