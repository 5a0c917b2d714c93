pub mod config;
pub mod engine;
pub mod monitor;
pub mod orchestrator;
pub mod scheduler;
