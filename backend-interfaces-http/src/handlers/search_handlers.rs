use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};

use backend_application::queries::search_queries;
use backend_application::AppState;
use backend_domain::{SearchRequest, SearchResponse};

use crate::error::HttpError;

/// Raw query-string shape of the search endpoint. Level and service accept
/// comma-separated lists, timestamps are RFC 3339.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub query: Option<String>,
    pub level: Option<String>,
    pub service: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

pub async fn search_logs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, HttpError> {
    let request = build_search_request(params)?;
    Ok(Json(search_queries::search_logs(&state, request).await))
}

fn build_search_request(params: SearchParams) -> Result<SearchRequest, HttpError> {
    let start_time = parse_instant(params.start_time.as_deref(), "startTime")?;
    let end_time = parse_instant(params.end_time.as_deref(), "endTime")?;

    Ok(SearchRequest {
        query: params.query,
        levels: split_csv(params.level.as_deref()),
        services: split_csv(params.service.as_deref()),
        hosts: Vec::new(),
        start_time,
        end_time,
        page: params.page.unwrap_or(0),
        size: params.size.unwrap_or(50),
        sort_by: params.sort_by.unwrap_or_else(|| "timestamp".to_string()),
        sort_order: params
            .sort_direction
            .unwrap_or_else(|| "desc".to_string()),
    })
}

fn parse_instant(value: Option<&str>, name: &str) -> Result<Option<DateTime<Utc>>, HttpError> {
    match value {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|parsed| Some(parsed.with_timezone(&Utc)))
            .map_err(|_| HttpError::BadRequest(format!("invalid {}: '{}'", name, raw))),
    }
}

fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
