//! ExperimentReader - rebuilds one experiment's flowchart from the graph

use super::category::CategoryRegistry;
use super::error::{NoteError, NoteResult};
use super::models::*;
use crate::neo4j::{GraphStore, StoredNode};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Reads experiments back into category-typed domain objects
pub struct ExperimentReader {
    store: Arc<dyn GraphStore>,
}

impl ExperimentReader {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Load an experiment with its nodes and the edges among them.
    ///
    /// Only relationships whose both endpoints belong to this experiment are
    /// returned, even if the store holds edges into other experiments.
    pub async fn get(&self, id: Uuid) -> NoteResult<ExperimentDetails> {
        let header = self
            .store
            .get_experiment(id)
            .await?
            .ok_or_else(|| NoteError::experiment_not_found(id))?;
        let Some(project) = header.project else {
            tracing::warn!(experiment_id = %id, "Experiment is not attached to any project");
            return Err(NoteError::NotFound(format!(
                "Project of experiment {} not found",
                id
            )));
        };

        let stored = self.store.get_experiment_nodes(id).await?;
        // element id -> caller id, for every node one hop below the experiment
        let owned: HashMap<&str, &str> = stored
            .iter()
            .filter_map(|n| n.caller_id().map(|cid| (n.element_id.as_str(), cid)))
            .collect();

        let mut nodes: Vec<FlowNode> = stored.iter().map(to_flow_node).collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let relationships = self.store.get_experiment_relationships(id).await?;
        let mut edges: Vec<FlowEdge> = Vec::new();
        for rel in &relationships {
            match (
                owned.get(rel.start_element_id.as_str()),
                owned.get(rel.end_element_id.as_str()),
            ) {
                (Some(source), Some(target)) => edges.push(FlowEdge {
                    source_id: source.to_string(),
                    target_id: target.to_string(),
                    edge_type: rel.rel_type.clone(),
                }),
                _ => tracing::warn!(
                    experiment_id = %id,
                    rel_type = %rel.rel_type,
                    "Ignoring relationship that leaves the experiment"
                ),
            }
        }
        edges.sort();
        edges.dedup();

        let record = header.record;
        Ok(ExperimentDetails {
            id: record.id,
            project_id: Some(project.element_id),
            project_name: project.name,
            folder_path: record.folder_path,
            experiment_name: record.name,
            registrant: record.registrant,
            registration_date: record.registration_date,
            nodes,
            edges,
        })
    }
}

fn to_flow_node(node: &StoredNode) -> FlowNode {
    let category = Category::from_labels(&node.labels).unwrap_or_else(|| {
        tracing::warn!(labels = ?node.labels, "Node has no known category label, showing as Others");
        Category::Others
    });
    FlowNode {
        id: node.caller_id().unwrap_or_default().to_string(),
        category: category.to_string(),
        properties: CategoryRegistry::shape_for_display(category, &node.properties),
    }
}
