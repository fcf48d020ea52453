//! Neo4j client, models and value conversion for the food interaction graph

pub mod client;
mod impl_graph_store;
pub mod models;
pub mod traits;
pub mod value;

pub use client::{Neo4jClient, Neo4jConnector};
pub use models::*;
pub use traits::{InteractionStore, StoreConnector};
pub use value::{normalize_records, normalize_value, GraphValue, RawRecord, Record};

#[cfg(test)]
pub(crate) mod mock;
