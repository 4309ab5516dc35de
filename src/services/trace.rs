use crate::model::{Factor, TraceResult};
use crate::services::EnvironmentService;
use crate::store::{Inventory, MaterialCatalog, TransactionLog};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("transaction not found")]
    TransactionNotFound,
    #[error("material batch not found")]
    MaterialBatchNotFound,
    #[error("material not found")]
    MaterialNotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Assembles the provenance of a material batch from a check-out
/// transaction: the batch with its fully resolved material, the original
/// check-in, the check-out, and the environmental extrema recorded at the
/// batch's storage site while it sat there. Read-only.
pub struct TraceService {
    transactions: Arc<dyn TransactionLog>,
    inventory: Arc<dyn Inventory>,
    materials: Arc<dyn MaterialCatalog>,
    environment: Arc<EnvironmentService>,
}

impl TraceService {
    pub fn new(
        transactions: Arc<dyn TransactionLog>,
        inventory: Arc<dyn Inventory>,
        materials: Arc<dyn MaterialCatalog>,
        environment: Arc<EnvironmentService>,
    ) -> Self {
        Self {
            transactions,
            inventory,
            materials,
            environment,
        }
    }

    pub async fn trace(&self, transaction_id: Uuid) -> Result<TraceResult, TraceError> {
        let check_out = self
            .transactions
            .transaction(transaction_id)
            .await?
            .ok_or(TraceError::TransactionNotFound)?;

        // The log is newest-first; its tail is the original check-in.
        let check_in = self
            .transactions
            .log_for_batch(check_out.material_batch_id)
            .await?
            .pop()
            .ok_or(TraceError::TransactionNotFound)?;

        let mut batch = self
            .inventory
            .batch(check_out.material_batch_id)
            .await?
            .ok_or(TraceError::MaterialBatchNotFound)?;

        // The inventory view doesn't carry custom material property
        // values; swap in the full material record.
        let material = self
            .materials
            .material(batch.material.id)
            .await?
            .ok_or(TraceError::MaterialNotFound)?;
        batch.material = material;

        let site_id = batch.storage_location.storage_site_id;
        let temperature = self
            .environment
            .extrema(
                site_id,
                Factor::Temperature,
                check_in.timestamp,
                check_out.timestamp,
            )
            .await?;
        let humidity = self
            .environment
            .extrema(
                site_id,
                Factor::Humidity,
                check_in.timestamp,
                check_out.timestamp,
            )
            .await?;

        Ok(TraceResult {
            batch,
            check_in_transaction: check_in,
            check_out_transaction: check_out,
            temperature,
            humidity,
        })
    }
}
