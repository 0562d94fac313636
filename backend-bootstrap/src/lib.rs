pub mod context;
pub mod lifecycle;
mod queue_bridge;

pub use lifecycle::run;
