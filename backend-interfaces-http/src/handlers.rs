pub mod dashboard_handlers;
pub mod ops_handlers;
pub mod search_handlers;

pub use dashboard_handlers::*;
pub use ops_handlers::*;
pub use search_handlers::*;
