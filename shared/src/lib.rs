pub mod calendar;
pub mod shifts;
pub mod telemetry;
pub mod types;
