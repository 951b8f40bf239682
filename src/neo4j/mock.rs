//! In-memory mock implementation of GraphStore for testing.
//!
//! Holds a small labeled property graph behind a `tokio::sync::RwLock`.
//! A transaction takes the write lock, works on a private copy and swaps it
//! in on commit, so rolled-back or dropped transactions leave no trace.
//! Conditionally compiled with `#[cfg(test)]`.

use crate::neo4j::models::*;
use crate::neo4j::traits::{GraphStore, GraphTxn};
use crate::notes::{
    folder_segments, normalize_folder_path, ExperimentFilter, FlowEdge, NodePredicate, PathMatch,
    Properties,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct MemNode {
    pub labels: Vec<String>,
    pub properties: Properties,
}

impl MemNode {
    fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    fn prop_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemRelationship {
    pub start: String,
    pub end: String,
    pub rel_type: String,
}

/// The whole mock database
#[derive(Debug, Clone, Default)]
pub struct MemGraph {
    next_id: u64,
    pub nodes: BTreeMap<String, MemNode>,
    pub relationships: Vec<MemRelationship>,
}

impl MemGraph {
    fn create_node(&mut self, label: &str, properties: Properties) -> String {
        self.next_id += 1;
        let id = format!("mem:{:06}", self.next_id);
        self.nodes.insert(
            id.clone(),
            MemNode {
                labels: vec![label.to_string()],
                properties,
            },
        );
        id
    }

    fn find_node(&self, label: &str, pred: impl Fn(&MemNode) -> bool) -> Option<String> {
        self.nodes
            .iter()
            .find(|(_, n)| n.has_label(label) && pred(n))
            .map(|(id, _)| id.clone())
    }

    fn children(&self, start: &str) -> Vec<String> {
        self.relationships
            .iter()
            .filter(|r| r.start == start && r.rel_type == CONTAINS)
            .map(|r| r.end.clone())
            .collect()
    }

    fn merge_relationship(&mut self, start: &str, end: &str, rel_type: &str) {
        let rel = MemRelationship {
            start: start.to_string(),
            end: end.to_string(),
            rel_type: rel_type.to_string(),
        };
        if !self.relationships.contains(&rel) {
            self.relationships.push(rel);
        }
    }

    fn detach_delete(&mut self, id: &str) {
        self.nodes.remove(id);
        self.relationships.retain(|r| r.start != id && r.end != id);
    }

    fn experiment(&self, id: Uuid) -> Option<String> {
        let id = id.to_string();
        self.find_node("Experiment", |n| n.prop_str("id") == Some(id.as_str()))
    }

    fn require_anchor(&self, anchor: &AnchorRef) -> Result<()> {
        match self.nodes.get(&anchor.element_id) {
            Some(n) if n.has_label(anchor.kind.label()) => Ok(()),
            _ => Err(anyhow!(
                "{} '{}' not found",
                anchor.kind.label(),
                anchor.name
            )),
        }
    }

    fn owned_node(&self, experiment: &str, caller_id: &str) -> Option<String> {
        self.children(experiment)
            .into_iter()
            .find(|id| self.nodes[id].prop_str("id") == Some(caller_id))
    }

    /// Walk containment edges upward until a Project is reached
    fn project_above(&self, id: &str) -> Option<String> {
        let mut frontier = vec![id.to_string()];
        let mut seen = Vec::new();
        while let Some(current) = frontier.pop() {
            if seen.contains(&current) {
                continue;
            }
            for rel in self
                .relationships
                .iter()
                .filter(|r| r.end == current && r.rel_type == CONTAINS)
            {
                if self.nodes[&rel.start].has_label("Project") {
                    return Some(rel.start.clone());
                }
                frontier.push(rel.start.clone());
            }
            seen.push(current);
        }
        None
    }

    fn descendants(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut frontier = self.children(id);
        while let Some(current) = frontier.pop() {
            if out.contains(&current) {
                continue;
            }
            frontier.extend(self.children(&current));
            out.push(current);
        }
        out
    }

    fn record(&self, id: &str) -> Result<ExperimentRecord> {
        let node = &self.nodes[id];
        let field = |key: &str| node.prop_str(key).unwrap_or_default().to_string();
        Ok(ExperimentRecord {
            id: Uuid::parse_str(&field("id"))?,
            name: field("name"),
            registrant: field("registrant"),
            registration_date: field("registration_date").parse()?,
            project_name: field("project_name"),
            folder_path: field("folder_path"),
        })
    }

    fn experiments_sorted(&self, ids: Vec<String>) -> Result<Vec<ExperimentRecord>> {
        let mut records = ids
            .iter()
            .map(|id| self.record(id))
            .collect::<Result<Vec<_>>>()?;
        records.sort_by(|a, b| {
            b.registration_date
                .cmp(&a.registration_date)
                .then_with(|| a.name.cmp(&b.name))
        });
        records.dedup_by_key(|r| r.id);
        Ok(records)
    }
}

fn record_properties(record: &ExperimentRecord) -> Properties {
    let mut props = Properties::new();
    props.insert("id".into(), json!(record.id.to_string()));
    props.insert("name".into(), json!(record.name));
    props.insert("registrant".into(), json!(record.registrant));
    props.insert(
        "registration_date".into(),
        json!(record.registration_date.to_string()),
    );
    props.insert("project_name".into(), json!(record.project_name));
    props.insert("folder_path".into(), json!(record.folder_path));
    props
}

fn path_matches(candidate: &str, filter: &str, mode: PathMatch) -> bool {
    let candidate = folder_segments(candidate);
    let filter = folder_segments(filter);
    match mode {
        PathMatch::Exact => candidate == filter,
        PathMatch::Prefix => candidate.starts_with(&filter),
    }
}

/// In-memory mock implementation of GraphStore for testing.
pub struct MockGraphStore {
    graph: Arc<RwLock<MemGraph>>,
    failing_edge_type: Option<String>,
}

impl MockGraphStore {
    /// Create a new empty MockGraphStore.
    pub fn new() -> Self {
        Self {
            graph: Arc::new(RwLock::new(MemGraph::default())),
            failing_edge_type: None,
        }
    }

    /// Make every attempt to create an edge of `rel_type` fail like a
    /// rejected statement.
    pub fn with_failing_edge_type(mut self, rel_type: &str) -> Self {
        self.failing_edge_type = Some(rel_type.to_string());
        self
    }

    /// Copy of the committed graph
    pub async fn snapshot(&self) -> MemGraph {
        self.graph.read().await.clone()
    }

    /// Number of committed nodes carrying `label`
    pub async fn count_label(&self, label: &str) -> usize {
        self.graph
            .read()
            .await
            .nodes
            .values()
            .filter(|n| n.has_label(label))
            .count()
    }

    /// Number of committed relationships of `rel_type`
    pub async fn count_relationships(&self, rel_type: &str) -> usize {
        self.graph
            .read()
            .await
            .relationships
            .iter()
            .filter(|r| r.rel_type == rel_type)
            .count()
    }

    /// Seed a relationship between nodes of two (possibly different)
    /// experiments, bypassing the per-experiment wiring rules.
    pub async fn link_nodes(
        &self,
        from: (Uuid, &str),
        to: (Uuid, &str),
        rel_type: &str,
    ) -> Result<()> {
        let mut graph = self.graph.write().await;
        let locate = |graph: &MemGraph, (exp, id): (Uuid, &str)| {
            graph
                .experiment(exp)
                .and_then(|e| graph.owned_node(&e, id))
                .ok_or_else(|| anyhow!("node {} of {} not found", id, exp))
        };
        let start = locate(&*graph, from)?;
        let end = locate(&*graph, to)?;
        graph.merge_relationship(&start, &end, rel_type);
        Ok(())
    }
}

impl Default for MockGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MockGraphStore {
    async fn begin(&self) -> Result<Box<dyn GraphTxn>> {
        let guard = self.graph.clone().write_owned().await;
        let working = guard.clone();
        Ok(Box::new(MockTxn {
            guard: Some(guard),
            working,
            failing_edge_type: self.failing_edge_type.clone(),
        }))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn get_experiment(&self, id: Uuid) -> Result<Option<ExperimentHeader>> {
        let graph = self.graph.read().await;
        let Some(exp) = graph.experiment(id) else {
            return Ok(None);
        };
        let project = graph.project_above(&exp).map(|p| ProjectRef {
            name: graph.nodes[&p]
                .prop_str("name")
                .unwrap_or_default()
                .to_string(),
            element_id: p,
        });
        Ok(Some(ExperimentHeader {
            record: graph.record(&exp)?,
            project,
        }))
    }

    async fn get_experiment_nodes(&self, id: Uuid) -> Result<Vec<StoredNode>> {
        let graph = self.graph.read().await;
        let Some(exp) = graph.experiment(id) else {
            return Ok(vec![]);
        };
        Ok(graph
            .children(&exp)
            .into_iter()
            .map(|element_id| {
                let node = &graph.nodes[&element_id];
                StoredNode {
                    labels: node.labels.clone(),
                    properties: node.properties.clone(),
                    element_id,
                }
            })
            .collect())
    }

    async fn get_experiment_relationships(&self, id: Uuid) -> Result<Vec<StoredRelationship>> {
        let graph = self.graph.read().await;
        let Some(exp) = graph.experiment(id) else {
            return Ok(vec![]);
        };
        let owned = graph.children(&exp);
        Ok(graph
            .relationships
            .iter()
            .filter(|r| owned.contains(&r.start))
            .map(|r| StoredRelationship {
                start_element_id: r.start.clone(),
                end_element_id: r.end.clone(),
                rel_type: r.rel_type.clone(),
            })
            .collect())
    }

    async fn list_projects(&self) -> Result<Vec<String>> {
        let graph = self.graph.read().await;
        let mut names: Vec<String> = graph
            .nodes
            .values()
            .filter(|n| n.has_label("Project"))
            .filter_map(|n| n.prop_str("name").map(String::from))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn list_folder_paths(&self, project_name: &str) -> Result<Vec<Vec<String>>> {
        let graph = self.graph.read().await;
        let Some(project) =
            graph.find_node("Project", |n| n.prop_str("name") == Some(project_name))
        else {
            return Ok(vec![]);
        };

        let mut paths = Vec::new();
        let mut frontier: Vec<(String, Vec<String>)> = vec![(project, vec![])];
        while let Some((node, prefix)) = frontier.pop() {
            for child in graph.children(&node) {
                let child_node = &graph.nodes[&child];
                if !child_node.has_label("Folder") {
                    continue;
                }
                let mut path = prefix.clone();
                path.push(child_node.prop_str("name").unwrap_or_default().to_string());
                paths.push(path.clone());
                frontier.push((child, path));
            }
        }
        Ok(paths)
    }

    async fn list_experiments(&self, filter: &ExperimentFilter) -> Result<Vec<ExperimentRecord>> {
        let graph = self.graph.read().await;
        let Some(project) = graph.find_node("Project", |n| {
            n.prop_str("name") == Some(filter.project_name.as_str())
        }) else {
            return Ok(vec![]);
        };

        let ids = graph
            .descendants(&project)
            .into_iter()
            .filter(|id| graph.nodes[id].has_label("Experiment"))
            .filter(|id| match &filter.folder_path {
                None => true,
                Some(path) => path_matches(
                    &normalize_folder_path(graph.nodes[id].prop_str("folder_path").unwrap_or("/")),
                    path,
                    filter.path_match,
                ),
            })
            .collect();
        graph.experiments_sorted(ids)
    }

    async fn find_experiments_by_node(
        &self,
        predicate: &NodePredicate,
    ) -> Result<Vec<ExperimentRecord>> {
        let graph = self.graph.read().await;
        let ids = graph
            .nodes
            .iter()
            .filter(|(_, n)| n.has_label("Experiment"))
            .filter(|(id, _)| {
                graph.children(id).iter().any(|child| {
                    let node = &graph.nodes[child];
                    let category_ok = predicate
                        .category
                        .map_or(true, |c| node.has_label(c.label()));
                    category_ok
                        && node
                            .properties
                            .get(&predicate.property)
                            .is_some_and(|v| predicate.matches(v))
                })
            })
            .map(|(id, _)| id.clone())
            .collect();
        graph.experiments_sorted(ids)
    }
}

/// Transaction over a private copy of the graph
pub struct MockTxn {
    guard: Option<OwnedRwLockWriteGuard<MemGraph>>,
    working: MemGraph,
    failing_edge_type: Option<String>,
}

impl MockTxn {
    fn graph(&mut self) -> Result<&mut MemGraph> {
        if self.guard.is_none() {
            return Err(anyhow!("Transaction already finished"));
        }
        Ok(&mut self.working)
    }
}

#[async_trait]
impl GraphTxn for MockTxn {
    async fn merge_project(&mut self, name: &str) -> Result<AnchorRef> {
        let graph = self.graph()?;
        let element_id = match graph.find_node("Project", |n| n.prop_str("name") == Some(name)) {
            Some(id) => id,
            None => {
                let mut props = Properties::new();
                props.insert("name".into(), json!(name));
                graph.create_node("Project", props)
            }
        };
        Ok(AnchorRef {
            kind: AnchorKind::Project,
            element_id,
            name: name.to_string(),
        })
    }

    async fn merge_folder(&mut self, parent: &AnchorRef, name: &str) -> Result<AnchorRef> {
        let graph = self.graph()?;
        graph.require_anchor(parent)?;
        let existing = graph.children(&parent.element_id).into_iter().find(|id| {
            let node = &graph.nodes[id];
            node.has_label("Folder") && node.prop_str("name") == Some(name)
        });
        let element_id = match existing {
            Some(id) => id,
            None => {
                let mut props = Properties::new();
                props.insert("name".into(), json!(name));
                let id = graph.create_node("Folder", props);
                graph.merge_relationship(&parent.element_id, &id, CONTAINS);
                id
            }
        };
        Ok(AnchorRef {
            kind: AnchorKind::Folder,
            element_id,
            name: name.to_string(),
        })
    }

    async fn create_experiment(
        &mut self,
        parent: &AnchorRef,
        record: &ExperimentRecord,
    ) -> Result<()> {
        let graph = self.graph()?;
        graph.require_anchor(parent)?;
        if graph.experiment(record.id).is_some() {
            return Err(anyhow!(
                "Node already exists with label `Experiment` and property `id` = '{}'",
                record.id
            ));
        }
        let id = graph.create_node("Experiment", record_properties(record));
        graph.merge_relationship(&parent.element_id, &id, CONTAINS);
        Ok(())
    }

    async fn update_experiment(&mut self, record: &ExperimentRecord) -> Result<bool> {
        let graph = self.graph()?;
        let Some(id) = graph.experiment(record.id) else {
            return Ok(false);
        };
        if let Some(node) = graph.nodes.get_mut(&id) {
            node.properties.extend(record_properties(record));
        }
        Ok(true)
    }

    async fn relink_experiment(&mut self, parent: &AnchorRef, experiment_id: Uuid) -> Result<()> {
        let graph = self.graph()?;
        graph.require_anchor(parent)?;
        let exp = graph
            .experiment(experiment_id)
            .ok_or_else(|| anyhow!("Experiment {} not found", experiment_id))?;
        let nodes = &graph.nodes;
        graph.relationships.retain(|r| {
            !(r.end == exp
                && r.rel_type == CONTAINS
                && (nodes[&r.start].has_label("Project") || nodes[&r.start].has_label("Folder")))
        });
        graph.merge_relationship(&parent.element_id, &exp, CONTAINS);
        Ok(())
    }

    async fn delete_flow_nodes(&mut self, experiment_id: Uuid) -> Result<u64> {
        let graph = self.graph()?;
        let Some(exp) = graph.experiment(experiment_id) else {
            return Ok(0);
        };
        let owned = graph.children(&exp);
        for id in &owned {
            graph.detach_delete(id);
        }
        Ok(owned.len() as u64)
    }

    async fn merge_flow_node(&mut self, experiment_id: Uuid, node: &FlowNodeWrite) -> Result<()> {
        let graph = self.graph()?;
        let exp = graph
            .experiment(experiment_id)
            .ok_or_else(|| anyhow!("Experiment {} vanished", experiment_id))?;
        let exp_key = experiment_id.to_string();
        let label = node.category.label();

        let existing = graph.find_node(label, |n| {
            n.prop_str("id") == Some(node.id.as_str())
                && n.prop_str("experiment_id") == Some(exp_key.as_str())
        });
        let element_id = match existing {
            Some(id) => id,
            None => {
                let mut props = Properties::new();
                props.insert("id".into(), Value::from(node.id.clone()));
                props.insert("experiment_id".into(), Value::from(exp_key));
                graph.create_node(label, props)
            }
        };
        if let Some(stored) = graph.nodes.get_mut(&element_id) {
            stored.properties.extend(node.properties.clone());
        }
        graph.merge_relationship(&exp, &element_id, CONTAINS);
        Ok(())
    }

    async fn merge_flow_edge(&mut self, experiment_id: Uuid, edge: &FlowEdge) -> Result<()> {
        if self.failing_edge_type.as_deref() == Some(edge.edge_type.as_str()) {
            return Err(anyhow!(
                "Invalid relationship type `{}`",
                edge.edge_type
            ));
        }
        let graph = self.graph()?;
        let Some(exp) = graph.experiment(experiment_id) else {
            return Ok(());
        };
        let source = graph.owned_node(&exp, &edge.source_id);
        let target = graph.owned_node(&exp, &edge.target_id);
        if let (Some(a), Some(b)) = (source, target) {
            graph.merge_relationship(&a, &b, &edge.edge_type);
        }
        Ok(())
    }

    async fn delete_experiment(&mut self, experiment_id: Uuid) -> Result<u64> {
        let graph = self.graph()?;
        let Some(exp) = graph.experiment(experiment_id) else {
            return Ok(0);
        };
        let owned = graph.children(&exp);
        for id in &owned {
            graph.detach_delete(id);
        }
        graph.detach_delete(&exp);
        Ok(1 + owned.len() as u64)
    }

    async fn commit(&mut self) -> Result<()> {
        let mut guard = self
            .guard
            .take()
            .ok_or_else(|| anyhow!("Transaction already finished"))?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.guard.take();
        Ok(())
    }
}
