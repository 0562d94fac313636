// Elasticsearch-backed log index
// Plain HTTP + JSON against the cluster; request bodies and responses are
// built and picked apart with serde_json, with the field vocabulary coming
// from the shared schema module.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use backend_domain::ports::LogIndex;
use backend_domain::schema;
use backend_domain::{
    DbConfig,
    LogRecord,
    LogVolumePoint,
    SearchRequest,
    SearchResponse,
    TermBucket,
};

pub struct ElasticLogIndex {
    client: Client,
    base_url: String,
    index: String,
    shards: u32,
    replicas: u32,
}

impl ElasticLogIndex {
    pub fn new(config: &DbConfig, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.max(3)))
            .build()
            .context("failed to build elasticsearch client")?;
        Ok(Self {
            client,
            base_url: config.elastic_url.trim_end_matches('/').to_string(),
            index: config.elastic_index.clone(),
            shards: config.elastic_shards,
            replicas: config.elastic_replicas,
        })
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.base_url, self.index)
    }

    async fn execute_search(&self, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}/_search", self.index_url()))
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl LogIndex for ElasticLogIndex {
    async fn ensure_index(&self) -> Result<()> {
        let probe = self
            .client
            .head(self.index_url())
            .send()
            .await
            .context("elasticsearch unreachable")?;

        if probe.status() == StatusCode::NOT_FOUND {
            info!("creating log index {}", self.index);
            let response = self
                .client
                .put(self.index_url())
                .json(&index_settings(self.shards, self.replicas))
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(anyhow!("failed to create index {}: {} {}", self.index, status, body));
            }
            info!("log index {} created", self.index);
        } else if probe.status().is_success() {
            debug!("log index {} already exists", self.index);
        } else {
            return Err(anyhow!("index probe failed: {}", probe.status()));
        }
        Ok(())
    }

    async fn index_log(&self, record: &LogRecord) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/_doc", self.index_url()))
            .json(&document_from_record(record))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("indexing failed: {} {}", status, body));
        }

        let body: Value = response.json().await?;
        body.get("_id")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| anyhow!("index response missing _id"))
    }

    async fn search_logs(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let body = build_search_body(request);
        let payload = self.execute_search(&body).await?;
        Ok(parse_search_response(&payload, request.page, request.size))
    }

    async fn count_logs(&self, level: Option<&str>) -> Result<u64> {
        let query = match level {
            Some(level) => json!({"term": {(schema::FIELD_LEVEL): level}}),
            None => json!({"match_all": {}}),
        };
        let payload = self.execute_search(&json!({"size": 0, "query": query})).await?;
        Ok(total_hits(&payload))
    }

    async fn volume_histogram(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LogVolumePoint>> {
        let body = json!({
            "size": 0,
            "query": {"range": {(schema::FIELD_TIMESTAMP): {
                "gte": format_timestamp(start),
                "lte": format_timestamp(end),
            }}},
            "aggs": {(schema::AGG_VOLUME_OVER_TIME): {"date_histogram": {
                "field": schema::FIELD_TIMESTAMP,
                "fixed_interval": "1h",
                "min_doc_count": 0,
            }}},
        });
        let payload = self.execute_search(&body).await?;
        Ok(parse_volume_buckets(&payload))
    }

    async fn level_terms(&self) -> Result<(u64, Vec<TermBucket>)> {
        let body = json!({
            "size": 0,
            "aggs": {(schema::AGG_LEVEL_DISTRIBUTION): {
                "terms": {"field": schema::FIELD_LEVEL}
            }},
        });
        let payload = self.execute_search(&body).await?;
        let buckets = parse_term_buckets(&payload, schema::AGG_LEVEL_DISTRIBUTION);
        Ok((total_hits(&payload), buckets))
    }

    async fn service_terms(&self, limit: u32) -> Result<Vec<TermBucket>> {
        let body = json!({
            "size": 0,
            "aggs": {(schema::AGG_TOP_SERVICES): {
                "terms": {"field": schema::FIELD_SERVICE, "size": limit}
            }},
        });
        let payload = self.execute_search(&body).await?;
        Ok(parse_term_buckets(&payload, schema::AGG_TOP_SERVICES))
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .get(&self.base_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn index_settings(shards: u32, replicas: u32) -> Value {
    json!({
        "settings": {
            "number_of_shards": shards,
            "number_of_replicas": replicas,
        },
        "mappings": {
            "properties": {
                (schema::FIELD_TIMESTAMP): {"type": "date", "format": "strict_date_optional_time"},
                (schema::FIELD_LEVEL): {"type": "keyword"},
                (schema::FIELD_MESSAGE): {"type": "text", "analyzer": "standard"},
                (schema::FIELD_SERVICE): {"type": "keyword"},
                (schema::FIELD_HOST): {"type": "keyword"},
                (schema::FIELD_ENVIRONMENT): {"type": "keyword"},
                (schema::FIELD_TRACE_ID): {"type": "keyword"},
                (schema::FIELD_SPAN_ID): {"type": "keyword"},
                (schema::FIELD_METADATA): {"type": "object", "enabled": true},
            }
        }
    })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

/// Flatten a record into the stored document. Missing fields are written
/// as nulls so the document shape stays uniform; metadata is attached only
/// when present.
fn document_from_record(record: &LogRecord) -> Value {
    let mut document = Map::new();
    document.insert(
        schema::FIELD_TIMESTAMP.to_string(),
        json!(record.timestamp.map(format_timestamp)),
    );
    document.insert(schema::FIELD_LEVEL.to_string(), json!(record.level));
    document.insert(schema::FIELD_MESSAGE.to_string(), json!(record.message));
    document.insert(schema::FIELD_SERVICE.to_string(), json!(record.service));
    document.insert(schema::FIELD_HOST.to_string(), json!(record.host));
    document.insert(schema::FIELD_ENVIRONMENT.to_string(), json!(record.environment));
    document.insert(schema::FIELD_TRACE_ID.to_string(), json!(record.trace_id));
    document.insert(schema::FIELD_SPAN_ID.to_string(), json!(record.span_id));
    if let Some(metadata) = &record.metadata {
        document.insert(schema::FIELD_METADATA.to_string(), json!(metadata));
    }
    Value::Object(document)
}

fn record_from_document(source: &Value) -> LogRecord {
    LogRecord {
        timestamp: source
            .get(schema::FIELD_TIMESTAMP)
            .and_then(Value::as_str)
            .and_then(parse_timestamp),
        level: string_field(source, schema::FIELD_LEVEL),
        message: string_field(source, schema::FIELD_MESSAGE),
        service: string_field(source, schema::FIELD_SERVICE),
        host: string_field(source, schema::FIELD_HOST),
        environment: string_field(source, schema::FIELD_ENVIRONMENT),
        trace_id: string_field(source, schema::FIELD_TRACE_ID),
        span_id: string_field(source, schema::FIELD_SPAN_ID),
        metadata: source
            .get(schema::FIELD_METADATA)
            .and_then(Value::as_object)
            .map(|map| map.iter().map(|(key, value)| (key.clone(), value.clone())).collect()),
    }
}

fn string_field(source: &Value, field: &str) -> Option<String> {
    source.get(field).and_then(Value::as_str).map(ToString::to_string)
}

/// Translate a search request into the query DSL. Filters are attached
/// only when their inputs are non-empty, and any sort order other than
/// "asc" (case-insensitive) falls back to descending.
fn build_search_body(request: &SearchRequest) -> Value {
    let mut must = Vec::new();
    if let Some(query) = request.query.as_deref() {
        if !query.is_empty() {
            must.push(json!({"match": {(schema::FIELD_MESSAGE): query}}));
        }
    }

    let mut filter = Vec::new();
    if !request.levels.is_empty() {
        filter.push(json!({"terms": {(schema::FIELD_LEVEL): request.levels}}));
    }
    if !request.services.is_empty() {
        filter.push(json!({"terms": {(schema::FIELD_SERVICE): request.services}}));
    }
    if request.start_time.is_some() || request.end_time.is_some() {
        let mut range = Map::new();
        if let Some(start) = request.start_time {
            range.insert("gte".to_string(), json!(format_timestamp(start)));
        }
        if let Some(end) = request.end_time {
            range.insert("lte".to_string(), json!(format_timestamp(end)));
        }
        filter.push(json!({"range": {(schema::FIELD_TIMESTAMP): range}}));
    }

    let order = if request.sort_order.eq_ignore_ascii_case("asc") {
        "asc"
    } else {
        "desc"
    };

    json!({
        "from": u64::from(request.page) * u64::from(request.size),
        "size": request.size,
        "sort": [{(request.sort_by.as_str()): {"order": order}}],
        "query": {"bool": {"must": must, "filter": filter}},
    })
}

fn parse_search_response(payload: &Value, page: u32, size: u32) -> SearchResponse {
    let logs = payload
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit.get("_source"))
                .map(record_from_document)
                .collect()
        })
        .unwrap_or_default();

    SearchResponse {
        logs,
        total: total_hits(payload),
        page,
        size,
    }
}

fn total_hits(payload: &Value) -> u64 {
    payload
        .pointer("/hits/total/value")
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

#[derive(Debug, Deserialize)]
struct RawTermBucket {
    key: BucketKey,
    doc_count: u64,
}

/// Terms buckets keyed by keyword fields come back as strings, numeric
/// fields as integers. Both normalize to a string key.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BucketKey {
    Text(String),
    Number(i64),
}

impl BucketKey {
    fn into_string(self) -> String {
        match self {
            BucketKey::Text(text) => text,
            BucketKey::Number(number) => number.to_string(),
        }
    }
}

fn parse_term_buckets(payload: &Value, aggregation: &str) -> Vec<TermBucket> {
    let pointer = format!("/aggregations/{}/buckets", aggregation);
    let Some(raw) = payload.pointer(&pointer) else {
        return Vec::new();
    };
    match serde_json::from_value::<Vec<RawTermBucket>>(raw.clone()) {
        Ok(buckets) => buckets
            .into_iter()
            .map(|bucket| TermBucket {
                key: bucket.key.into_string(),
                doc_count: bucket.doc_count,
            })
            .collect(),
        Err(err) => {
            warn!("unrecognized {} aggregation shape: {}", aggregation, err);
            Vec::new()
        }
    }
}

fn parse_volume_buckets(payload: &Value) -> Vec<LogVolumePoint> {
    let pointer = format!("/aggregations/{}/buckets", schema::AGG_VOLUME_OVER_TIME);
    payload
        .pointer(&pointer)
        .and_then(Value::as_array)
        .map(|buckets| buckets.iter().filter_map(volume_point).collect())
        .unwrap_or_default()
}

fn volume_point(bucket: &Value) -> Option<LogVolumePoint> {
    let count = bucket.get("doc_count").and_then(Value::as_u64).unwrap_or(0);
    let timestamp = bucket
        .get("key_as_string")
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
        .or_else(|| {
            bucket
                .get("key")
                .and_then(Value::as_i64)
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        })?;
    Some(LogVolumePoint { timestamp, count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_body_pages_with_absolute_offset() {
        let request = SearchRequest {
            page: 2,
            size: 25,
            ..SearchRequest::default()
        };
        let body = build_search_body(&request);
        assert_eq!(body["from"], json!(50));
        assert_eq!(body["size"], json!(25));
    }

    #[test]
    fn search_body_defaults_sort_to_descending_timestamp() {
        let body = build_search_body(&SearchRequest::default());
        assert_eq!(body["sort"], json!([{"timestamp": {"order": "desc"}}]));
    }

    #[test]
    fn search_body_sorts_ascending_only_for_asc() {
        let mut request = SearchRequest::default();
        request.sort_order = "ASC".to_string();
        let body = build_search_body(&request);
        assert_eq!(body["sort"][0]["timestamp"]["order"], json!("asc"));

        request.sort_order = "ascending".to_string();
        let body = build_search_body(&request);
        assert_eq!(body["sort"][0]["timestamp"]["order"], json!("desc"));
    }

    #[test]
    fn search_body_omits_clauses_without_input() {
        let body = build_search_body(&SearchRequest::default());
        assert_eq!(body["query"]["bool"]["must"], json!([]));
        assert_eq!(body["query"]["bool"]["filter"], json!([]));
    }

    #[test]
    fn search_body_builds_all_clauses() {
        let request = SearchRequest {
            query: Some("timeout".to_string()),
            levels: vec!["ERROR".to_string(), "WARN".to_string()],
            services: vec!["checkout".to_string()],
            start_time: Some("2025-06-01T00:00:00Z".parse().expect("valid start")),
            end_time: None,
            ..SearchRequest::default()
        };
        let body = build_search_body(&request);

        assert_eq!(
            body["query"]["bool"]["must"],
            json!([{"match": {"message": "timeout"}}])
        );
        let filter = body["query"]["bool"]["filter"].as_array().expect("filter array");
        assert_eq!(filter[0], json!({"terms": {"level": ["ERROR", "WARN"]}}));
        assert_eq!(filter[1], json!({"terms": {"service": ["checkout"]}}));
        assert_eq!(
            filter[2],
            json!({"range": {"timestamp": {"gte": "2025-06-01T00:00:00.000Z"}}})
        );
    }

    #[test]
    fn document_round_trips_through_index_shape() {
        let record = LogRecord {
            timestamp: Some("2025-06-01T12:00:00Z".parse().expect("valid timestamp")),
            level: Some("ERROR".to_string()),
            message: Some("boom".to_string()),
            service: Some("checkout".to_string()),
            host: Some("node-3".to_string()),
            environment: Some("prod".to_string()),
            trace_id: Some("t-1".to_string()),
            span_id: None,
            metadata: Some(
                [("hasException".to_string(), json!(true))].into_iter().collect(),
            ),
        };

        let document = document_from_record(&record);
        assert_eq!(document["timestamp"], json!("2025-06-01T12:00:00.000Z"));
        assert_eq!(document["spanId"], Value::Null);

        let parsed = record_from_document(&document);
        assert_eq!(parsed, record);
    }

    #[test]
    fn index_settings_map_core_fields() {
        let settings = index_settings(3, 1);
        assert_eq!(settings["settings"]["number_of_shards"], json!(3));
        assert_eq!(settings["mappings"]["properties"]["message"]["type"], json!("text"));
        assert_eq!(settings["mappings"]["properties"]["level"]["type"], json!("keyword"));
        assert_eq!(
            settings["mappings"]["properties"]["timestamp"]["format"],
            json!("strict_date_optional_time")
        );
    }

    #[test]
    fn term_buckets_accept_string_and_numeric_keys() {
        let payload = json!({
            "aggregations": {
                "level_distribution": {
                    "buckets": [
                        {"key": "ERROR", "doc_count": 7},
                        {"key": 404, "doc_count": 3},
                    ]
                }
            }
        });

        let buckets = parse_term_buckets(&payload, "level_distribution");
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, "ERROR");
        assert_eq!(buckets[0].doc_count, 7);
        assert_eq!(buckets[1].key, "404");
    }

    #[test]
    fn term_buckets_degrade_to_empty_on_odd_shapes() {
        let missing = json!({"aggregations": {}});
        assert!(parse_term_buckets(&missing, "level_distribution").is_empty());

        let null_buckets = json!({"aggregations": {"level_distribution": {"buckets": null}}});
        assert!(parse_term_buckets(&null_buckets, "level_distribution").is_empty());

        let garbage = json!({"aggregations": {"level_distribution": {"buckets": [{"key": {"nested": true}, "doc_count": 1}]}}});
        assert!(parse_term_buckets(&garbage, "level_distribution").is_empty());
    }

    #[test]
    fn volume_points_prefer_rendered_key() {
        let payload = json!({
            "aggregations": {
                "volume_over_time": {
                    "buckets": [
                        {"key_as_string": "2025-06-01T10:00:00.000Z", "key": 1, "doc_count": 12},
                        {"key": 1748772000000_i64, "doc_count": 5},
                    ]
                }
            }
        });

        let points = parse_volume_buckets(&payload);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].count, 12);
        assert_eq!(points[0].timestamp, "2025-06-01T10:00:00Z".parse::<DateTime<Utc>>().expect("ts"));
        assert_eq!(points[1].count, 5);
        assert_eq!(points[1].timestamp.timestamp_millis(), 1_748_772_000_000);
    }

    #[test]
    fn search_response_parses_hits_and_total() {
        let payload = json!({
            "hits": {
                "total": {"value": 42, "relation": "eq"},
                "hits": [
                    {"_id": "doc-1", "_source": {"message": "a", "level": "INFO"}},
                    {"_id": "doc-2", "_source": {"message": "b"}},
                ]
            }
        });

        let response = parse_search_response(&payload, 1, 20);
        assert_eq!(response.total, 42);
        assert_eq!(response.page, 1);
        assert_eq!(response.logs.len(), 2);
        assert_eq!(response.logs[0].level.as_deref(), Some("INFO"));
        assert_eq!(response.logs[1].message.as_deref(), Some("b"));
    }

    #[test]
    fn search_response_tolerates_missing_sections() {
        let response = parse_search_response(&json!({}), 0, 20);
        assert_eq!(response.total, 0);
        assert!(response.logs.is_empty());
    }
}
