use super::{persister, reader};
use crate::config::Config;
use crate::model::{Snapshot, StorageSite};
use crate::store::{EnvironmentalStore, SiteDirectory};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Broker connection parameters shared by every site reader.
#[derive(Clone, Debug)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keepalive: Duration,
    pub topic_prefix: String,
}

impl MqttSettings {
    fn from_config(config: &Config) -> Self {
        Self {
            host: config.mqtt_host.clone(),
            port: config.mqtt_port,
            username: config.mqtt_username.clone(),
            password: config.mqtt_password.clone(),
            keepalive: config.mqtt_keepalive(),
            topic_prefix: config.mqtt_topic_prefix.clone(),
        }
    }
}

/// Owns the ingestion queue, the persister and the per-site readers.
/// Readers are started for every known site at startup and for every
/// site announced on the directory subscription afterwards; there is no
/// per-reader stop — process shutdown cancels everything cooperatively.
pub struct IngestCoordinator {
    queue: mpsc::Sender<Snapshot>,
    readers: Mutex<HashMap<Uuid, JoinHandle<()>>>,
    mqtt: MqttSettings,
    cancel: CancellationToken,
}

impl IngestCoordinator {
    pub async fn start(
        config: &Config,
        sites: Arc<dyn SiteDirectory>,
        store: Arc<dyn EnvironmentalStore>,
        cancel: CancellationToken,
    ) -> Result<Arc<Self>> {
        // Fail fast when the broker is unreachable; restart policy
        // belongs to the process supervisor, not this component.
        probe_broker(
            &config.mqtt_host,
            config.mqtt_port,
            config.broker_connect_timeout(),
        )
        .await?;

        let (tx, rx) = mpsc::channel::<Snapshot>(config.queue_capacity);
        persister::spawn(store, rx, cancel.clone());

        let coordinator = Arc::new(Self {
            queue: tx,
            readers: Mutex::new(HashMap::new()),
            mqtt: MqttSettings::from_config(config),
            cancel,
        });

        for site in sites.sites().await.context("failed to list storage sites")? {
            coordinator.track_site(&site).await;
        }

        let events = sites
            .subscribe()
            .await
            .context("failed to subscribe to storage site creation")?;
        coordinator.spawn_site_watcher(events);

        Ok(coordinator)
    }

    /// Registers a reader for every site announced on the directory
    /// subscription until shutdown or channel closure.
    pub(super) fn spawn_site_watcher(self: &Arc<Self>, mut events: mpsc::Receiver<StorageSite>) {
        let watcher = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = watcher.cancel.cancelled() => break,
                    site = events.recv() => match site {
                        Some(site) => {
                            tracing::info!(site=%site.id, name=%site.name, "storage site created");
                            watcher.track_site(&site).await;
                        }
                        None => break,
                    }
                }
            }
        });
    }

    /// Starts a reader for the site unless one is already running;
    /// duplicate registration is logged and ignored.
    pub async fn track_site(&self, site: &StorageSite) {
        let mut readers = self.readers.lock().await;
        if readers.contains_key(&site.id) {
            tracing::warn!(site=%site.id, "reader already running; ignoring duplicate registration");
            return;
        }
        let handle = reader::spawn(
            site.id,
            self.mqtt.clone(),
            self.queue.clone(),
            self.cancel.clone(),
        );
        readers.insert(site.id, handle);
        tracing::info!(site=%site.id, "started environment reader");
    }

    pub async fn is_tracking(&self, site_id: Uuid) -> bool {
        self.readers.lock().await.contains_key(&site_id)
    }

    pub async fn reader_count(&self) -> usize {
        self.readers.lock().await.len()
    }

    #[cfg(test)]
    pub(super) fn for_tests(
        queue: mpsc::Sender<Snapshot>,
        mqtt: MqttSettings,
        cancel: CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue,
            readers: Mutex::new(HashMap::new()),
            mqtt,
            cancel,
        })
    }
}

async fn probe_broker(host: &str, port: u16, timeout: Duration) -> Result<()> {
    tokio::time::timeout(timeout, TcpStream::connect((host, port)))
        .await
        .with_context(|| format!("timed out connecting to telemetry broker {host}:{port}"))?
        .with_context(|| format!("telemetry broker {host}:{port} is unreachable"))?;
    Ok(())
}
