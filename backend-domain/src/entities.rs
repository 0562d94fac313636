// Domain entities

pub mod anomaly;
pub mod log_record;
pub mod prediction;
pub mod runtime;
pub mod search;

pub use anomaly::*;
pub use log_record::*;
pub use prediction::*;
pub use runtime::*;
pub use search::*;
