use super::coordinator::MqttSettings;
use crate::model::Snapshot;
use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Spawns the long-lived reader task for one storage site. The reader
/// only ever enqueues; writing to the store is the persister's job.
pub(super) fn spawn(
    site_id: Uuid,
    mqtt: MqttSettings,
    queue: mpsc::Sender<Snapshot>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move { run(site_id, mqtt, queue, cancel).await })
}

async fn run(
    site_id: Uuid,
    mqtt: MqttSettings,
    queue: mpsc::Sender<Snapshot>,
    cancel: CancellationToken,
) {
    let topic = format!("{}-{}", mqtt.topic_prefix, site_id);
    loop {
        if cancel.is_cancelled() {
            break;
        }
        match run_once(site_id, &topic, &mqtt, &queue, &cancel).await {
            Ok(()) => break,
            Err(err) => {
                tracing::warn!(error=%err, topic=%topic, "environment feed dropped; reconnecting");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(RECONNECT_DELAY) => {}
                }
            }
        }
    }
    tracing::info!(topic=%topic, "environment reader shut down");
}

/// One subscription lifetime. Returns `Ok` on cancellation or queue
/// closure; transport errors bubble up so the outer loop reconnects.
async fn run_once(
    site_id: Uuid,
    topic: &str,
    mqtt: &MqttSettings,
    queue: &mpsc::Sender<Snapshot>,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut options = MqttOptions::new(
        format!("env-reader-{}-{}", site_id, std::process::id()),
        mqtt.host.clone(),
        mqtt.port,
    );
    options.set_keep_alive(mqtt.keepalive);
    if let Some(username) = &mqtt.username {
        options.set_credentials(username.clone(), mqtt.password.clone().unwrap_or_default());
    }

    let (client, mut eventloop) = AsyncClient::new(options, 32);
    client.subscribe(topic, QoS::AtLeastOnce).await?;
    tracing::info!(topic=%topic, "subscribed to environment feed");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = client.disconnect().await;
                return Ok(());
            }
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Incoming::Publish(publish))) => {
                    // Decode errors are per-message: log, skip, keep reading.
                    match parse_snapshot(site_id, publish.payload.as_ref()) {
                        Ok(snapshot) => {
                            if queue.send(snapshot).await.is_err() {
                                return Ok(());
                            }
                        }
                        Err(err) => {
                            tracing::warn!(error=%err, topic=%publish.topic, "failed to decode environment payload")
                        }
                    }
                }
                Ok(Event::Incoming(Incoming::Disconnect)) => anyhow::bail!("mqtt disconnected"),
                Ok(_) => {}
                Err(err) => anyhow::bail!(err),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireSnapshot<'a> {
    #[serde(default, borrow)]
    timestamp: Option<WireTimestamp<'a>>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireTimestamp<'a> {
    Str(&'a str),
    Int(i64),
    Float(f64),
}

impl WireTimestamp<'_> {
    fn to_datetime(&self) -> DateTime<Utc> {
        match self {
            WireTimestamp::Str(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            WireTimestamp::Int(ms) => millis_to_dt(*ms),
            WireTimestamp::Float(secs) => millis_to_dt((*secs * 1000.0) as i64),
        }
    }
}

fn millis_to_dt(ms: i64) -> DateTime<Utc> {
    let secs = ms / 1000;
    let nanos = ((ms % 1000) * 1_000_000) as u32;
    Utc.timestamp_opt(secs, nanos)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Decodes a telemetry payload into a snapshot for `site_id`. The payload
/// itself carries no site identity; the owning reader attaches it. A
/// missing timestamp falls back to receive time.
pub fn parse_snapshot(site_id: Uuid, payload: &[u8]) -> Result<Snapshot> {
    let wire: WireSnapshot = serde_json::from_slice(payload)?;
    let timestamp = wire
        .timestamp
        .as_ref()
        .map(|t| t.to_datetime())
        .unwrap_or_else(Utc::now);
    Ok(Snapshot {
        site_id,
        timestamp,
        temperature: wire.temperature,
        humidity: wire.humidity,
    })
}
