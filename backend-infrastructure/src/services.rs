pub mod alert_service;
pub mod prediction_client;

pub use alert_service::*;
pub use prediction_client::*;
