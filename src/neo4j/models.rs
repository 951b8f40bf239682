//! Flat property-graph records exchanged with the graph store

use crate::notes::{Category, ExperimentSummary, Properties};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Relationship type used for hierarchy and ownership
pub const CONTAINS: &str = "CONTAINS";

// ============================================================================
// Hierarchy
// ============================================================================

/// Kind of node an experiment or folder can hang under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorKind {
    Project,
    Folder,
}

impl AnchorKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Folder => "Folder",
        }
    }
}

/// Reference to a Project or Folder node inside the store.
///
/// `element_id` is the store's own identity for the node and is only
/// meaningful within the store that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorRef {
    pub kind: AnchorKind,
    pub element_id: String,
    pub name: String,
}

// ============================================================================
// Experiment
// ============================================================================

/// Attributes persisted on an Experiment node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub id: Uuid,
    pub name: String,
    pub registrant: String,
    pub registration_date: NaiveDate,
    pub project_name: String,
    /// Canonical `/a/b` rendering of the folder chain
    pub folder_path: String,
}

impl ExperimentRecord {
    pub fn summary(&self) -> ExperimentSummary {
        ExperimentSummary {
            id: self.id,
            name: self.name.clone(),
            registrant: self.registrant.clone(),
            registration_date: self.registration_date,
        }
    }
}

/// An experiment together with the project reached by walking up its
/// containment chain, if any.
#[derive(Debug, Clone)]
pub struct ExperimentHeader {
    pub record: ExperimentRecord,
    pub project: Option<ProjectRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub element_id: String,
    pub name: String,
}

// ============================================================================
// Flowchart
// ============================================================================

/// A validated flowchart node ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct FlowNodeWrite {
    pub id: String,
    pub category: Category,
    pub properties: Properties,
}

/// A node as stored: labels plus raw properties (internal keys included)
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNode {
    pub element_id: String,
    pub labels: Vec<String>,
    pub properties: Properties,
}

impl StoredNode {
    /// The caller-supplied id kept in the `id` property
    pub fn caller_id(&self) -> Option<&str> {
        self.properties.get("id").and_then(|v| v.as_str())
    }
}

/// A relationship leaving a node of an experiment. The end node may lie
/// outside the experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRelationship {
    pub start_element_id: String,
    pub end_element_id: String,
    pub rel_type: String,
}

/// Quote a relationship type or label for interpolation into Cypher
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
