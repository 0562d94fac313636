// Index schema vocabulary
// Field and aggregation names shared by the write and read paths so the
// two can never drift apart.

pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_LEVEL: &str = "level";
pub const FIELD_MESSAGE: &str = "message";
pub const FIELD_SERVICE: &str = "service";
pub const FIELD_HOST: &str = "host";
pub const FIELD_ENVIRONMENT: &str = "environment";
pub const FIELD_TRACE_ID: &str = "traceId";
pub const FIELD_SPAN_ID: &str = "spanId";
pub const FIELD_METADATA: &str = "metadata";

pub const AGG_VOLUME_OVER_TIME: &str = "volume_over_time";
pub const AGG_LEVEL_DISTRIBUTION: &str = "level_distribution";
pub const AGG_TOP_SERVICES: &str = "top_services";
