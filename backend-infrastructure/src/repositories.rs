// Port implementations backed by the two stores

pub mod clickhouse_anomalies;
pub mod elastic_index;

pub use clickhouse_anomalies::ClickhouseAnomalyStore;
pub use elastic_index::ElasticLogIndex;
