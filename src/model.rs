use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// An environmental factor recorded per storage site. Closed set; every
/// store query resolves its column through [`Factor::column`] so the
/// factor-to-field mapping lives in exactly one place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Factor {
    Temperature,
    Humidity,
}

impl Factor {
    pub fn column(&self) -> &'static str {
        match self {
            Factor::Temperature => "temperature",
            Factor::Humidity => "humidity",
        }
    }

    /// Projects the matching component out of a snapshot.
    pub fn component(&self, snapshot: &Snapshot) -> Option<f64> {
        match self {
            Factor::Temperature => snapshot.temperature,
            Factor::Humidity => snapshot.humidity,
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One decoded sensor reading for a storage site. The timestamp is the
/// producer's clock, not ingestion time; either component may be absent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub site_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

/// A single factor value at a point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Min and max recorded value over an interval. Both bounds are absent
/// iff the interval holds no points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Extrema {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageSite {
    pub id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageLocation {
    pub storage_site_id: Uuid,
    pub storage_area_id: Uuid,
}

/// A check-in or check-out logged against a material batch. Quantity is
/// signed from the storage location's point of view: positive checks
/// material in, negative checks it out.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub material_batch_id: Uuid,
    pub quantity: f64,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Material {
    pub id: i32,
    pub name: String,
    pub manufacturer: String,
    pub manufacturer_specific_id: String,
    #[serde(default)]
    pub custom_props: HashMap<Uuid, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterialBatch {
    pub id: Uuid,
    pub material: Material,
    pub storage_location: StorageLocation,
    pub batch_number: i64,
    pub expiration_date: DateTime<Utc>,
    pub quantity: f64,
    pub is_locked: bool,
    pub is_archived: bool,
}

/// Full provenance of a batch between its original check-in and a given
/// check-out: the batch with resolved material, both transactions, and the
/// environmental extrema recorded at its site during that interval.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceResult {
    pub batch: MaterialBatch,
    pub check_in_transaction: Transaction,
    pub check_out_transaction: Transaction,
    pub temperature: Extrema,
    pub humidity: Extrema,
}

/// A storage site decorated with its most recent environmental values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SiteOverview {
    pub site: StorageSite,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}
