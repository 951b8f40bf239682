//! ExperimentWriter - transactional create / replace / delete of experiments
//!
//! Each write validates the request up front, then runs every graph mutation
//! (hierarchy, experiment, flowchart nodes, edges) inside one transaction.
//! A failure at any step rolls the whole unit back.

use super::category::CategoryRegistry;
use super::error::{NoteError, NoteResult};
use super::models::*;
use super::path::{normalize_folder_path, PathResolver};
use crate::neo4j::{in_transaction, ExperimentRecord, FlowNodeWrite, GraphStore, GraphTxn, CONTAINS};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// A request that passed static validation
#[derive(Debug, Clone)]
struct PreparedExperiment {
    project_name: String,
    folder_path: String,
    name: String,
    registrant: String,
    registration_date: NaiveDate,
    nodes: Vec<FlowNodeWrite>,
    edges: Vec<FlowEdge>,
}

impl PreparedExperiment {
    fn record(&self, id: Uuid) -> ExperimentRecord {
        ExperimentRecord {
            id,
            name: self.name.clone(),
            registrant: self.registrant.clone(),
            registration_date: self.registration_date,
            project_name: self.project_name.clone(),
            folder_path: self.folder_path.clone(),
        }
    }
}

fn non_blank(value: &str, what: &str) -> NoteResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(NoteError::validation(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
}

/// Writes experiments and their flowcharts
pub struct ExperimentWriter {
    store: Arc<dyn GraphStore>,
}

impl ExperimentWriter {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Check everything that can be checked without the store and shape the
    /// request for writing. Edges whose endpoints are not declared in the
    /// request are dropped here.
    fn prepare(request: &ExperimentRequest) -> NoteResult<PreparedExperiment> {
        let project_name = non_blank(&request.project_name, "project name")?;
        let name = non_blank(&request.experiment_name, "experiment name")?;
        let registrant = non_blank(&request.registrant, "registrant")?;

        let mut seen = HashSet::new();
        let mut nodes = Vec::with_capacity(request.nodes.len());
        for node in &request.nodes {
            if node.id.trim().is_empty() {
                return Err(NoteError::validation("node id must not be empty"));
            }
            if !seen.insert(node.id.as_str()) {
                return Err(NoteError::validation(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
            let category = CategoryRegistry::resolve(&node.category)?;
            let properties = CategoryRegistry::shape(category, &node.properties)
                .map_err(|e| match e {
                    NoteError::Validation(msg) => {
                        NoteError::Validation(format!("node '{}': {}", node.id, msg))
                    }
                    other => other,
                })?;
            nodes.push(FlowNodeWrite {
                id: node.id.clone(),
                category,
                properties,
            });
        }

        let mut edges = BTreeSet::new();
        for edge in &request.edges {
            let edge_type = edge.edge_type.trim();
            if edge_type.is_empty() {
                return Err(NoteError::validation(format!(
                    "edge {} -> {} has no type",
                    edge.source_id, edge.target_id
                )));
            }
            if edge_type == CONTAINS {
                return Err(NoteError::validation(format!(
                    "edge type '{}' is reserved",
                    CONTAINS
                )));
            }
            if !seen.contains(edge.source_id.as_str()) || !seen.contains(edge.target_id.as_str()) {
                tracing::debug!(
                    source = %edge.source_id,
                    target = %edge.target_id,
                    edge_type,
                    "Skipping edge with an endpoint outside the request"
                );
                continue;
            }
            edges.insert(FlowEdge {
                source_id: edge.source_id.clone(),
                target_id: edge.target_id.clone(),
                edge_type: edge_type.to_string(),
            });
        }

        Ok(PreparedExperiment {
            project_name,
            folder_path: normalize_folder_path(&request.folder_path),
            name,
            registrant,
            registration_date: request.registration_date,
            nodes,
            edges: edges.into_iter().collect(),
        })
    }

    /// Create a new experiment and return its generated id
    pub async fn create(&self, request: &ExperimentRequest) -> NoteResult<Uuid> {
        let prepared = Self::prepare(request)?;
        let id = Uuid::new_v4();
        let (node_count, edge_count) = (prepared.nodes.len(), prepared.edges.len());

        in_transaction(self.store.as_ref(), move |txn| {
            Box::pin(async move {
                let chain =
                    PathResolver::resolve(txn, &prepared.project_name, &prepared.folder_path)
                        .await?;
                txn.create_experiment(chain.deepest(), &prepared.record(id))
                    .await?;
                write_flowchart(txn, id, &prepared).await
            })
        })
        .await?;

        tracing::info!(
            experiment_id = %id,
            nodes = node_count,
            edges = edge_count,
            "Created experiment"
        );
        Ok(id)
    }

    /// Replace an experiment's attributes, placement and flowchart.
    ///
    /// The old flowchart nodes (and their edges) are deleted and the request's
    /// flowchart is written fresh under the same experiment id.
    pub async fn update(&self, id: Uuid, request: &ExperimentRequest) -> NoteResult<()> {
        let prepared = Self::prepare(request)?;

        in_transaction(self.store.as_ref(), move |txn| {
            Box::pin(async move {
                if !txn.update_experiment(&prepared.record(id)).await? {
                    return Err(NoteError::experiment_not_found(id));
                }
                let chain =
                    PathResolver::resolve(txn, &prepared.project_name, &prepared.folder_path)
                        .await?;
                txn.relink_experiment(chain.deepest(), id).await?;

                let removed = txn.delete_flow_nodes(id).await?;
                tracing::debug!(experiment_id = %id, removed, "Cleared previous flowchart");

                write_flowchart(txn, id, &prepared).await
            })
        })
        .await?;

        tracing::info!(experiment_id = %id, "Updated experiment");
        Ok(())
    }

    /// Delete an experiment together with the nodes it owns
    pub async fn delete(&self, id: Uuid) -> NoteResult<()> {
        let deleted = in_transaction(self.store.as_ref(), move |txn| {
            Box::pin(async move {
                let deleted = txn.delete_experiment(id).await?;
                if deleted == 0 {
                    return Err(NoteError::experiment_not_found(id));
                }
                Ok::<_, NoteError>(deleted)
            })
        })
        .await?;

        tracing::info!(experiment_id = %id, deleted, "Deleted experiment");
        Ok(())
    }
}

async fn write_flowchart(
    txn: &mut dyn GraphTxn,
    id: Uuid,
    prepared: &PreparedExperiment,
) -> NoteResult<()> {
    for node in &prepared.nodes {
        txn.merge_flow_node(id, node).await?;
    }
    for edge in &prepared.edges {
        txn.merge_flow_edge(id, edge).await?;
    }
    Ok(())
}
