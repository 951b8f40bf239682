//! Neo4j client and models for the experiment notes graph

pub mod bolt;
pub mod client;
mod impl_graph_store;
pub mod models;
pub mod traits;
pub mod txn;

pub use client::Neo4jClient;
pub use models::*;
pub use traits::{in_transaction, GraphStore, GraphTxn};

#[cfg(test)]
pub(crate) mod mock;
