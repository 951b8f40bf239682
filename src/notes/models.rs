//! Experiment note models and DTOs
//!
//! An experiment note is a flowchart: category-tagged nodes joined by typed,
//! directed edges, filed under a project and a slash-delimited folder path.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Free-form property map of a flowchart node, keyed by display name
/// (e.g. `"Node Name"`, `"CAS RN"`).
pub type Properties = BTreeMap<String, serde_json::Value>;

// ============================================================================
// Core Enums
// ============================================================================

/// Category of a flowchart node. Doubles as the node's label in the graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Reagents, solvents, samples
    Substances,
    /// A processing step (mixing, heating, ...)
    Processing,
    /// A measurement or analysis step
    Measurement,
    /// Anything else
    Others,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Self::Substances,
        Self::Processing,
        Self::Measurement,
        Self::Others,
    ];

    /// Graph label for nodes of this category
    pub fn label(&self) -> &'static str {
        match self {
            Self::Substances => "Substances",
            Self::Processing => "Processing",
            Self::Measurement => "Measurement",
            Self::Others => "Others",
        }
    }

    /// Find the category named by one of a node's labels
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Option<Self> {
        labels.iter().find_map(|l| l.as_ref().parse().ok())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// How a folder path filter matches experiment folder paths
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PathMatch {
    /// Only experiments filed directly in the folder
    Exact,
    /// The folder and every folder below it
    #[default]
    Prefix,
}

/// How a node attribute predicate compares values
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Exact,
    Contains,
}

// ============================================================================
// Flowchart
// ============================================================================

/// A flowchart node as sent and returned by clients.
///
/// `category` stays a plain string on the wire so that an unknown category
/// surfaces as a validation error rather than a decode failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowNode {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub properties: Properties,
}

/// A typed, directed edge between two nodes of the same experiment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub edge_type: String,
}

// ============================================================================
// Requests / responses
// ============================================================================

/// Create or full-replace request for an experiment note
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentRequest {
    pub project_name: String,
    #[serde(default = "root_folder_path")]
    pub folder_path: String,
    pub experiment_name: String,
    pub registrant: String,
    pub registration_date: NaiveDate,
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

fn root_folder_path() -> String {
    "/".to_string()
}

/// A fully materialized experiment note
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentDetails {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub project_name: String,
    pub folder_path: String,
    pub experiment_name: String,
    pub registrant: String,
    pub registration_date: NaiveDate,
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

/// Listing entry for an experiment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentSummary {
    pub id: Uuid,
    pub name: String,
    pub registrant: String,
    pub registration_date: NaiveDate,
}

/// One folder of a project's folder tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderEntry {
    pub name: String,
    pub path: String,
    pub children: Vec<FolderEntry>,
}

// ============================================================================
// Query inputs
// ============================================================================

/// Which experiments of a project to list
#[derive(Debug, Clone, Default)]
pub struct ExperimentFilter {
    pub project_name: String,
    /// `None` lists the whole project
    pub folder_path: Option<String>,
    pub path_match: PathMatch,
}

/// Attribute predicate over flowchart nodes
#[derive(Debug, Clone)]
pub struct NodePredicate {
    /// Restrict to nodes of one category
    pub category: Option<Category>,
    pub property: String,
    pub value: String,
    pub mode: MatchMode,
}

impl NodePredicate {
    /// Exact match on one property of a category
    pub fn exact(category: Category, property: &str, value: &str) -> Self {
        Self {
            category: Some(category),
            property: property.to_string(),
            value: value.to_string(),
            mode: MatchMode::Exact,
        }
    }

    /// Substring match on one property of a category
    pub fn contains(category: Category, property: &str, value: &str) -> Self {
        Self {
            mode: MatchMode::Contains,
            ..Self::exact(category, property, value)
        }
    }

    /// Evaluate against a stored property value.
    ///
    /// Scalars compare through their text form. A list matches when any of
    /// its elements does, provided all elements share one scalar kind.
    /// Objects, mixed lists and integers beyond `i64` are kept as folded JSON
    /// by the store and never match.
    pub fn matches(&self, value: &Value) -> bool {
        match value {
            Value::Array(items) => {
                let uniform = items
                    .windows(2)
                    .all(|pair| same_scalar_kind(&pair[0], &pair[1]));
                uniform
                    && items
                        .iter()
                        .any(|item| scalar_text(item).is_some_and(|text| self.accepts(&text)))
            }
            other => scalar_text(other).is_some_and(|text| self.accepts(&text)),
        }
    }

    fn accepts(&self, text: &str) -> bool {
        match self.mode {
            MatchMode::Exact => text == self.value,
            MatchMode::Contains => text.contains(&self.value),
        }
    }
}

/// Text form of a natively stored scalar
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) if n.as_i64().is_some() || n.is_f64() => Some(n.to_string()),
        _ => None,
    }
}

fn same_scalar_kind(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(_), Value::String(_)) | (Value::Bool(_), Value::Bool(_)) => true,
        (Value::Number(x), Value::Number(y)) => x.is_f64() == y.is_f64(),
        _ => false,
    }
}
