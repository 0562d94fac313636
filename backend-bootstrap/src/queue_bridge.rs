// WebSocket bridge to the log queue broker
// One spawned task per process: subscribe, then ack/reject each delivery
// after running it through the ingestion pipeline.

use std::time::Duration;

use anyhow::Result;
use axum::http::header::AUTHORIZATION;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use backend_application::commands::ingest_commands;
use backend_application::AppState;
use backend_domain::LogRecord;

const RECONNECT_DELAY_SECONDS: u64 = 5;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

enum Delivery {
    Record(u64, LogRecord),
    /// Addressable frame whose record payload does not parse; rejected so
    /// the broker dead-letters it instead of redelivering forever.
    Malformed(u64),
}

pub fn spawn_queue_consumer(state: AppState) {
    let Some(queue_url) = state.config.queue_url.clone() else {
        info!("queue consumer disabled: no queue url configured");
        return;
    };

    tokio::spawn(async move {
        loop {
            match connect_queue(&queue_url, state.config.queue_token.as_deref()).await {
                Ok(mut ws) => {
                    info!("queue consumer connected: url={}", queue_url);
                    if let Err(err) = run_consumer_loop(&state, &mut ws).await {
                        warn!("queue consumer loop exited: {}", err);
                    }
                }
                Err(err) => {
                    warn!("queue connect failed: url={}, err={}", queue_url, err);
                }
            }
            sleep(Duration::from_secs(RECONNECT_DELAY_SECONDS)).await;
        }
    });
}

async fn connect_queue(url: &str, token: Option<&str>) -> Result<WsStream> {
    let mut request = url.into_client_request()?;
    if let Some(value) = token.filter(|raw| !raw.trim().is_empty()) {
        request
            .headers_mut()
            .insert(AUTHORIZATION, format!("Bearer {}", value).parse()?);
    }
    let (socket, _) = tokio_tungstenite::connect_async(request).await?;
    Ok(socket)
}

async fn run_consumer_loop(state: &AppState, ws: &mut WsStream) -> Result<()> {
    ws.send(Message::Text(subscribe_frame(&state.config.queue_name)))
        .await?;
    debug!("subscribed to queue {}", state.config.queue_name);

    while let Some(next) = ws.next().await {
        match next {
            Ok(Message::Text(text)) => {
                let Some(delivery) = parse_delivery_frame(&text) else {
                    warn!("skipping unrecognized queue frame");
                    continue;
                };
                let reply = match delivery {
                    Delivery::Record(delivery_tag, record) => {
                        match ingest_commands::process_log(state, record).await {
                            Ok(log_id) => {
                                debug!(
                                    "processed delivery {} as document {}",
                                    delivery_tag, log_id
                                );
                                ack_frame(delivery_tag)
                            }
                            Err(err) => {
                                warn!("processing failed for delivery {}: {}", delivery_tag, err);
                                reject_frame(delivery_tag)
                            }
                        }
                    }
                    Delivery::Malformed(delivery_tag) => {
                        warn!("rejecting malformed record in delivery {}", delivery_tag);
                        reject_frame(delivery_tag)
                    }
                };
                // A failed reply is not retried; a broken socket shows up
                // on the next read and triggers a reconnect.
                if let Err(err) = ws.send(Message::Text(reply)).await {
                    warn!("queue reply send failed: {}", err);
                }
            }
            Ok(Message::Ping(bytes)) => {
                ws.send(Message::Pong(bytes)).await?;
            }
            Ok(Message::Close(frame)) => {
                return Err(anyhow::anyhow!("queue closed by broker: {:?}", frame));
            }
            Ok(_) => {}
            Err(err) => {
                return Err(anyhow::anyhow!("queue stream error: {}", err));
            }
        }
    }
    Err(anyhow::anyhow!("queue stream ended"))
}

fn parse_delivery_frame(raw: &str) -> Option<Delivery> {
    let value: Value = serde_json::from_str(raw).ok()?;
    if value.get("type").and_then(Value::as_str) != Some("delivery") {
        return None;
    }
    let delivery_tag = value.get("deliveryTag").and_then(Value::as_u64)?;
    match value
        .get("record")
        .map(|record| serde_json::from_value::<LogRecord>(record.clone()))
    {
        Some(Ok(record)) => Some(Delivery::Record(delivery_tag, record)),
        _ => Some(Delivery::Malformed(delivery_tag)),
    }
}

fn subscribe_frame(queue: &str) -> String {
    json!({"type": "subscribe", "queue": queue}).to_string()
}

fn ack_frame(delivery_tag: u64) -> String {
    json!({"type": "ack", "deliveryTag": delivery_tag}).to_string()
}

fn reject_frame(delivery_tag: u64) -> String {
    json!({"type": "reject", "deliveryTag": delivery_tag, "requeue": false}).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_delivery_frame_with_record() {
        let delivery = parse_delivery_frame(
            r#"{"type":"delivery","deliveryTag":42,"record":{"level":"error","message":"boom","service":"checkout"}}"#,
        )
        .expect("delivery");
        match delivery {
            Delivery::Record(tag, record) => {
                assert_eq!(tag, 42);
                assert_eq!(record.level.as_deref(), Some("error"));
                assert_eq!(record.service.as_deref(), Some("checkout"));
            }
            Delivery::Malformed(_) => panic!("record should parse"),
        }
    }

    #[test]
    fn flags_unparseable_record_as_malformed() {
        let delivery =
            parse_delivery_frame(r#"{"type":"delivery","deliveryTag":7,"record":"not-an-object"}"#)
                .expect("delivery");
        assert!(matches!(delivery, Delivery::Malformed(7)));

        let missing = parse_delivery_frame(r#"{"type":"delivery","deliveryTag":8}"#)
            .expect("delivery");
        assert!(matches!(missing, Delivery::Malformed(8)));
    }

    #[test]
    fn ignores_non_delivery_frames() {
        assert!(parse_delivery_frame(r#"{"type":"info","message":"hello"}"#).is_none());
        assert!(parse_delivery_frame(r#"{"type":"delivery","record":{}}"#).is_none());
        assert!(parse_delivery_frame("not json at all").is_none());
    }

    #[test]
    fn reply_frames_carry_tag_and_requeue_policy() {
        let ack: Value = serde_json::from_str(&ack_frame(7)).expect("valid json");
        assert_eq!(ack["type"], "ack");
        assert_eq!(ack["deliveryTag"], 7);

        let reject: Value = serde_json::from_str(&reject_frame(7)).expect("valid json");
        assert_eq!(reject["type"], "reject");
        assert_eq!(reject["deliveryTag"], 7);
        assert_eq!(reject["requeue"], false);

        let subscribe: Value = serde_json::from_str(&subscribe_frame("logs.raw")).expect("valid json");
        assert_eq!(subscribe["type"], "subscribe");
        assert_eq!(subscribe["queue"], "logs.raw");
    }
}
