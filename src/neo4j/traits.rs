//! GraphStore / GraphTxn trait definitions
//!
//! `GraphStore` is the read side plus the entry point for transactions;
//! `GraphTxn` exposes the typed write primitives that run inside one
//! transaction. Both are implemented by `Neo4jClient` and by the in-memory
//! mock used in tests.

use crate::neo4j::models::*;
use crate::notes::{ExperimentFilter, FlowEdge, NodePredicate};
use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Read operations and transaction factory of the graph store.
///
/// Reads run outside any explicit transaction.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Open a write transaction
    async fn begin(&self) -> Result<Box<dyn GraphTxn>>;

    /// Check connectivity
    async fn health_check(&self) -> Result<bool>;

    // ========================================================================
    // Experiment reads
    // ========================================================================

    /// Experiment attributes plus its owning project
    async fn get_experiment(&self, id: Uuid) -> Result<Option<ExperimentHeader>>;

    /// Nodes one containment hop below the experiment
    async fn get_experiment_nodes(&self, id: Uuid) -> Result<Vec<StoredNode>>;

    /// Every non-containment relationship leaving one of the experiment's
    /// nodes, wherever it ends
    async fn get_experiment_relationships(&self, id: Uuid) -> Result<Vec<StoredRelationship>>;

    // ========================================================================
    // Hierarchy / search reads
    // ========================================================================

    /// All project names
    async fn list_projects(&self) -> Result<Vec<String>>;

    /// Every folder chain below a project, as lists of segment names
    async fn list_folder_paths(&self, project_name: &str) -> Result<Vec<Vec<String>>>;

    /// Experiments of a project matching the folder filter
    async fn list_experiments(&self, filter: &ExperimentFilter) -> Result<Vec<ExperimentRecord>>;

    /// Experiments owning at least one node that satisfies the predicate
    async fn find_experiments_by_node(
        &self,
        predicate: &NodePredicate,
    ) -> Result<Vec<ExperimentRecord>>;
}

/// Write primitives executed inside one transaction.
///
/// Nothing becomes visible to readers before `commit`. Dropping a
/// transaction without committing discards its writes.
#[async_trait]
pub trait GraphTxn: Send {
    /// Upsert a Project node by name
    async fn merge_project(&mut self, name: &str) -> Result<AnchorRef>;

    /// Upsert a Folder node below `parent`, matched by (parent, name)
    async fn merge_folder(&mut self, parent: &AnchorRef, name: &str) -> Result<AnchorRef>;

    /// Create an Experiment node contained by `parent`
    async fn create_experiment(&mut self, parent: &AnchorRef, record: &ExperimentRecord)
        -> Result<()>;

    /// Overwrite experiment attributes. Returns false if no such experiment.
    async fn update_experiment(&mut self, record: &ExperimentRecord) -> Result<bool>;

    /// Replace the experiment's incoming hierarchy edge with one from `parent`
    async fn relink_experiment(&mut self, parent: &AnchorRef, experiment_id: Uuid) -> Result<()>;

    /// Detach-delete every node owned by the experiment. Returns the count.
    async fn delete_flow_nodes(&mut self, experiment_id: Uuid) -> Result<u64>;

    /// Upsert a node keyed by (experiment, caller id) and link it to the
    /// experiment
    async fn merge_flow_node(&mut self, experiment_id: Uuid, node: &FlowNodeWrite) -> Result<()>;

    /// Merge a typed relationship between two nodes of the experiment
    async fn merge_flow_edge(&mut self, experiment_id: Uuid, edge: &FlowEdge) -> Result<()>;

    /// Detach-delete the experiment and its nodes. Returns nodes deleted.
    async fn delete_experiment(&mut self, experiment_id: Uuid) -> Result<u64>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;
}

/// Run `work` inside a fresh transaction: commit when it succeeds, roll back
/// on any error. The error of `work` wins over a failing rollback.
pub async fn in_transaction<T, E, F>(store: &dyn GraphStore, work: F) -> Result<T, E>
where
    T: Send,
    E: From<anyhow::Error> + std::fmt::Display,
    F: for<'t> FnOnce(&'t mut dyn GraphTxn) -> BoxFuture<'t, Result<T, E>>,
{
    let mut txn = store.begin().await?;

    let outcome = work(txn.as_mut()).await;
    match outcome {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(e) => {
            tracing::warn!("Rolling back transaction: {}", e);
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!("Rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}
