pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod export;
pub mod share;
pub mod store;
pub mod telemetry;
