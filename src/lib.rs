pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod reduce;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

#[cfg(test)]
pub mod test_support;
