//! Read-only collaborator contracts for the inventory side of the system.
//! The CRUD persistence of sites, batches, materials and transactions
//! lives elsewhere; these traits carry only the lookups the trace and the
//! reader coordination need.

use crate::model::{Material, MaterialBatch, StorageLocation, StorageSite, Transaction};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgListener;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

#[async_trait]
pub trait TransactionLog: Send + Sync {
    async fn transaction(&self, id: Uuid) -> Result<Option<Transaction>>;

    /// Full log for a batch, newest entry first.
    async fn log_for_batch(&self, batch_id: Uuid) -> Result<Vec<Transaction>>;
}

#[async_trait]
pub trait Inventory: Send + Sync {
    /// The inventory view of a batch. Its material carries no custom
    /// property values; resolve the full material separately.
    async fn batch(&self, id: Uuid) -> Result<Option<MaterialBatch>>;
}

#[async_trait]
pub trait MaterialCatalog: Send + Sync {
    async fn material(&self, id: i32) -> Result<Option<Material>>;
}

#[async_trait]
pub trait SiteDirectory: Send + Sync {
    async fn sites(&self) -> Result<Vec<StorageSite>>;

    /// Channel of storage sites created after subscription time.
    async fn subscribe(&self) -> Result<mpsc::Receiver<StorageSite>>;
}

pub struct PgTransactionLog {
    pool: PgPool,
}

impl PgTransactionLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn transaction_from_row(row: &sqlx::postgres::PgRow) -> Result<Transaction> {
    Ok(Transaction {
        id: row.try_get("id")?,
        material_batch_id: row.try_get("material_batch_id")?,
        quantity: row.try_get("quantity")?,
        timestamp: row.try_get("ts")?,
        user_id: row.try_get("user_id")?,
    })
}

#[async_trait]
impl TransactionLog for PgTransactionLog {
    async fn transaction(&self, id: Uuid) -> Result<Option<Transaction>> {
        let row = sqlx::query(
            r#"
            SELECT id, material_batch_id, quantity, ts, user_id
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn log_for_batch(&self, batch_id: Uuid) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, material_batch_id, quantity, ts, user_id
            FROM transactions
            WHERE material_batch_id = $1
            ORDER BY ts DESC
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(transaction_from_row).collect()
    }
}

pub struct PgInventory {
    pool: PgPool,
}

impl PgInventory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Inventory for PgInventory {
    async fn batch(&self, id: Uuid) -> Result<Option<MaterialBatch>> {
        let row = sqlx::query(
            r#"
            SELECT b.id, b.material_id, m.name AS material_name,
                   m.manufacturer, m.manufacturer_specific_id,
                   b.storage_site_id, b.storage_area_id, b.batch_number,
                   b.expiration_date, b.quantity, b.is_locked, b.is_archived
            FROM material_batches b
            JOIN materials m ON m.id = b.material_id
            WHERE b.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        Ok(Some(MaterialBatch {
            id: row.try_get("id")?,
            material: Material {
                id: row.try_get("material_id")?,
                name: row.try_get("material_name")?,
                manufacturer: row.try_get("manufacturer")?,
                manufacturer_specific_id: row.try_get("manufacturer_specific_id")?,
                custom_props: HashMap::new(),
            },
            storage_location: StorageLocation {
                storage_site_id: row.try_get("storage_site_id")?,
                storage_area_id: row.try_get("storage_area_id")?,
            },
            batch_number: row.try_get("batch_number")?,
            expiration_date: row.try_get("expiration_date")?,
            quantity: row.try_get("quantity")?,
            is_locked: row.try_get("is_locked")?,
            is_archived: row.try_get("is_archived")?,
        }))
    }
}

pub struct PgMaterialCatalog {
    pool: PgPool,
}

impl PgMaterialCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MaterialCatalog for PgMaterialCatalog {
    async fn material(&self, id: i32) -> Result<Option<Material>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, manufacturer, manufacturer_specific_id
            FROM materials
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let prop_rows = sqlx::query(
            r#"
            SELECT prop_id, value
            FROM material_prop_values
            WHERE material_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut custom_props = HashMap::with_capacity(prop_rows.len());
        for prop in prop_rows {
            custom_props.insert(prop.try_get("prop_id")?, prop.try_get("value")?);
        }

        Ok(Some(Material {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            manufacturer: row.try_get("manufacturer")?,
            manufacturer_specific_id: row.try_get("manufacturer_specific_id")?,
            custom_props,
        }))
    }
}

/// Channel the site-CRUD layer notifies on after inserting a storage
/// site; the payload is the JSON-serialized site.
const SITE_CREATED_CHANNEL: &str = "storage_site_created";

pub struct PgSiteDirectory {
    pool: PgPool,
}

impl PgSiteDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SiteDirectory for PgSiteDirectory {
    async fn sites(&self) -> Result<Vec<StorageSite>> {
        let rows = sqlx::query("SELECT id, name FROM storage_sites ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        let mut sites = Vec::with_capacity(rows.len());
        for row in rows {
            sites.push(StorageSite {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            });
        }
        Ok(sites)
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<StorageSite>> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(SITE_CREATED_CHANNEL).await?;

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        match serde_json::from_str::<StorageSite>(notification.payload()) {
                            Ok(site) => {
                                if tx.send(site).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => {
                                tracing::warn!(error=%err, "invalid storage site notification payload")
                            }
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error=%err, "storage site listener failed; retrying");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        });
        Ok(rx)
    }
}
