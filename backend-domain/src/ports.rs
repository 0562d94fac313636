// Ports the pipeline depends on: the two stores, the scoring client and
// the alert sink. Infrastructure supplies the implementations.

pub mod repositories;
pub mod services;

pub use repositories::*;
pub use services::*;
