// Domain layer - Chart view models and rules
pub mod chart;
pub mod error;
pub mod granularity;
pub mod sensor;
pub mod session;
pub mod telemetry;
