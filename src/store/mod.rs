pub mod environment;
pub mod inventory;

use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub use environment::{EnvironmentalStore, PgEnvironmentalStore};
pub use inventory::{
    Inventory, MaterialCatalog, PgInventory, PgMaterialCatalog, PgSiteDirectory, PgTransactionLog,
    SiteDirectory, TransactionLog,
};

pub async fn build_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}
