use tracing::error;

use backend_domain::{SearchRequest, SearchResponse};

use crate::AppState;

/// Run a paged search against the index. An unreachable index yields an
/// empty page rather than an error, matching the dashboard queries.
pub async fn search_logs(state: &AppState, request: SearchRequest) -> SearchResponse {
    match state.log_index.search_logs(&request).await {
        Ok(response) => response,
        Err(err) => {
            error!("log search failed: {}", err);
            SearchResponse::empty(request.page, request.size)
        }
    }
}
