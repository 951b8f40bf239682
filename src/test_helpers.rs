//! Test helper factories and mock state builders
//!
//! Convenience constructors for experiment requests with sensible defaults,
//! and managers backed by the in-memory graph.
#![allow(dead_code)]

use crate::neo4j::mock::MockGraphStore;
use crate::notes::{ExperimentRequest, FlowEdge, FlowNode, NoteManager, Properties};
use crate::{AppState, Config};
use serde_json::json;
use std::sync::Arc;

// ============================================================================
// Mock state builders
// ============================================================================

/// Create a mock AppState with an empty in-memory graph
pub fn mock_app_state() -> AppState {
    AppState {
        neo4j: Arc::new(MockGraphStore::new()),
        config: Arc::new(Config {
            neo4j_uri: "bolt://mock:7687".to_string(),
            neo4j_user: "neo4j".to_string(),
            neo4j_password: "mock".to_string(),
            server_port: 0,
            cors_origins: vec![],
        }),
    }
}

/// A NoteManager over a fresh mock store, plus the store for inspection
pub fn mock_note_manager() -> (NoteManager, Arc<MockGraphStore>) {
    let store = Arc::new(MockGraphStore::new());
    (NoteManager::new(store.clone()), store)
}

// ============================================================================
// Request factories
// ============================================================================

/// A request without nodes or edges. `date` is `YYYY-MM-DD`.
pub fn sample_request(project: &str, folder_path: &str, name: &str, date: &str) -> ExperimentRequest {
    ExperimentRequest {
        project_name: project.to_string(),
        folder_path: folder_path.to_string(),
        experiment_name: name.to_string(),
        registrant: "tester".to_string(),
        registration_date: date.parse().unwrap(),
        nodes: vec![],
        edges: vec![],
    }
}

/// A node of any category carrying only its `Node Name`
pub fn flow_node(id: &str, category: &str, name: &str) -> FlowNode {
    let mut properties = Properties::new();
    properties.insert("Node Name".to_string(), json!(name));
    FlowNode {
        id: id.to_string(),
        category: category.to_string(),
        properties,
    }
}

pub fn substance_node(id: &str, name: &str) -> FlowNode {
    flow_node(id, "Substances", name)
}

pub fn flow_edge(source: &str, target: &str, edge_type: &str) -> FlowEdge {
    FlowEdge {
        source_id: source.to_string(),
        target_id: target.to_string(),
        edge_type: edge_type.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_app_state_is_healthy() {
        let state = mock_app_state();
        assert!(state.neo4j.health_check().await.unwrap());
        assert!(state.neo4j.list_projects().await.unwrap().is_empty());
    }
}
