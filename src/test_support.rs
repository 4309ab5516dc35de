//! In-memory collaborator doubles shared by the unit tests.

use crate::model::{
    DataPoint, Extrema, Factor, Material, MaterialBatch, Snapshot, StorageLocation, StorageSite,
    Transaction,
};
use crate::store::{
    EnvironmentalStore, Inventory, MaterialCatalog, SiteDirectory, TransactionLog,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

pub fn base_time() -> DateTime<Utc> {
    "2026-02-01T00:00:00Z".parse().unwrap()
}

pub fn snapshot(
    site_id: Uuid,
    offset_secs: i64,
    temperature: Option<f64>,
    humidity: Option<f64>,
) -> Snapshot {
    Snapshot {
        site_id,
        timestamp: base_time() + Duration::seconds(offset_secs),
        temperature,
        humidity,
    }
}

#[derive(Default)]
pub struct InMemoryEnvironmentalStore {
    rows: Mutex<Vec<Snapshot>>,
}

impl InMemoryEnvironmentalStore {
    pub fn recorded_for(&self, site_id: Uuid) -> Vec<Snapshot> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.site_id == site_id)
            .cloned()
            .collect()
    }

    pub fn recorded_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl EnvironmentalStore for InMemoryEnvironmentalStore {
    async fn latest(&self, site_id: Uuid, factor: Factor) -> Result<Option<DataPoint>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|s| s.site_id == site_id)
            .filter_map(|s| {
                factor.component(s).map(|value| DataPoint {
                    timestamp: s.timestamp,
                    value,
                })
            })
            .max_by_key(|p| p.timestamp))
    }

    async fn history(
        &self,
        site_id: Uuid,
        factor: Factor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DataPoint>> {
        let rows = self.rows.lock().unwrap();
        let mut points: Vec<DataPoint> = rows
            .iter()
            .filter(|s| s.site_id == site_id && s.timestamp > start && s.timestamp < end)
            .filter_map(|s| {
                factor.component(s).map(|value| DataPoint {
                    timestamp: s.timestamp,
                    value,
                })
            })
            .collect();
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }

    async fn extrema(
        &self,
        site_id: Uuid,
        factor: Factor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Extrema> {
        let points = self.history(site_id, factor, start, end).await?;
        Ok(Extrema {
            min_value: points
                .iter()
                .map(|p| p.value)
                .min_by(|a, b| a.total_cmp(b)),
            max_value: points
                .iter()
                .map(|p| p.value)
                .max_by(|a, b| a.total_cmp(b)),
        })
    }

    async fn record(&self, snapshot: &Snapshot) -> Result<()> {
        self.rows.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

pub struct InMemorySiteDirectory {
    sites: Vec<StorageSite>,
    events: Mutex<Option<mpsc::Receiver<StorageSite>>>,
}

impl InMemorySiteDirectory {
    pub fn new(sites: Vec<StorageSite>) -> (std::sync::Arc<Self>, mpsc::Sender<StorageSite>) {
        let (tx, rx) = mpsc::channel(16);
        (
            std::sync::Arc::new(Self {
                sites,
                events: Mutex::new(Some(rx)),
            }),
            tx,
        )
    }
}

#[async_trait]
impl SiteDirectory for InMemorySiteDirectory {
    async fn sites(&self) -> Result<Vec<StorageSite>> {
        Ok(self.sites.clone())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<StorageSite>> {
        self.events
            .lock()
            .unwrap()
            .take()
            .context("site directory already subscribed")
    }
}

#[derive(Default)]
pub struct InMemoryTransactionLog {
    pub transactions: Vec<Transaction>,
}

#[async_trait]
impl TransactionLog for InMemoryTransactionLog {
    async fn transaction(&self, id: Uuid) -> Result<Option<Transaction>> {
        Ok(self.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn log_for_batch(&self, batch_id: Uuid) -> Result<Vec<Transaction>> {
        let mut log: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.material_batch_id == batch_id)
            .cloned()
            .collect();
        log.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(log)
    }
}

#[derive(Default)]
pub struct CountingInventory {
    pub batches: HashMap<Uuid, MaterialBatch>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Inventory for CountingInventory {
    async fn batch(&self, id: Uuid) -> Result<Option<MaterialBatch>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.batches.get(&id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryMaterialCatalog {
    pub materials: HashMap<i32, Material>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl MaterialCatalog for InMemoryMaterialCatalog {
    async fn material(&self, id: i32) -> Result<Option<Material>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.materials.get(&id).cloned())
    }
}

pub fn sample_material(id: i32) -> Material {
    Material {
        id,
        name: format!("PP granulate {id}"),
        manufacturer: "Hanf & Nelke".to_string(),
        manufacturer_specific_id: format!("pp-{id}"),
        custom_props: HashMap::new(),
    }
}

pub fn sample_batch(id: Uuid, site_id: Uuid, material_id: i32) -> MaterialBatch {
    MaterialBatch {
        id,
        material: Material {
            // The inventory view carries no custom props; the trace
            // resolves the full material separately.
            custom_props: HashMap::new(),
            ..sample_material(material_id)
        },
        storage_location: StorageLocation {
            storage_site_id: site_id,
            storage_area_id: Uuid::new_v4(),
        },
        batch_number: 42,
        expiration_date: base_time() + Duration::days(365),
        quantity: 120.5,
        is_locked: false,
        is_archived: false,
    }
}

pub fn sample_transaction(
    id: Uuid,
    batch_id: Uuid,
    offset_secs: i64,
    quantity: f64,
) -> Transaction {
    Transaction {
        id,
        material_batch_id: batch_id,
        quantity,
        timestamp: base_time() + Duration::seconds(offset_secs),
        user_id: "alex".to_string(),
    }
}
