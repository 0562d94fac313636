// Adapters for the stores, the scoring service and the alert webhook

pub mod config;
pub mod repositories;
pub mod services;

pub use config::*;
pub use repositories::*;
pub use services::*;
