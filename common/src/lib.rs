// Shared library for the study planner: catalog and learner storage,
// schedule distribution, configuration and telemetry

pub mod config;
pub mod db;
pub mod errors;
pub mod lock;
pub mod models;
pub mod planner;
pub mod telemetry;
