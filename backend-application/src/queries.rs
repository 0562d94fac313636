// Read-side use cases

pub mod dashboard_queries;
pub mod search_queries;
