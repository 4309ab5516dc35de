mod coordinator;
mod persister;
mod reader;


pub use coordinator::{IngestCoordinator, MqttSettings};
pub use reader::parse_snapshot;
