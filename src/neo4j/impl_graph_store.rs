//! `GraphStore` implementation for `Neo4jClient`.
//!
//! Every method simply delegates to the corresponding inherent method on `Neo4jClient`.

use async_trait::async_trait;
use uuid::Uuid;

use super::client::Neo4jClient;
use super::models::*;
use super::traits::{GraphStore, GraphTxn};
use crate::notes::{ExperimentFilter, NodePredicate};

#[async_trait]
impl GraphStore for Neo4jClient {
    async fn begin(&self) -> anyhow::Result<Box<dyn GraphTxn>> {
        Ok(Box::new(self.begin().await?))
    }

    async fn health_check(&self) -> anyhow::Result<bool> {
        self.health_check().await
    }

    // ========================================================================
    // Experiment reads
    // ========================================================================

    async fn get_experiment(&self, id: Uuid) -> anyhow::Result<Option<ExperimentHeader>> {
        self.get_experiment(id).await
    }

    async fn get_experiment_nodes(&self, id: Uuid) -> anyhow::Result<Vec<StoredNode>> {
        self.get_experiment_nodes(id).await
    }

    async fn get_experiment_relationships(
        &self,
        id: Uuid,
    ) -> anyhow::Result<Vec<StoredRelationship>> {
        self.get_experiment_relationships(id).await
    }

    // ========================================================================
    // Hierarchy / search reads
    // ========================================================================

    async fn list_projects(&self) -> anyhow::Result<Vec<String>> {
        self.list_projects().await
    }

    async fn list_folder_paths(&self, project_name: &str) -> anyhow::Result<Vec<Vec<String>>> {
        self.list_folder_paths(project_name).await
    }

    async fn list_experiments(
        &self,
        filter: &ExperimentFilter,
    ) -> anyhow::Result<Vec<ExperimentRecord>> {
        self.list_experiments(filter).await
    }

    async fn find_experiments_by_node(
        &self,
        predicate: &NodePredicate,
    ) -> anyhow::Result<Vec<ExperimentRecord>> {
        self.find_experiments_by_node(predicate).await
    }
}
