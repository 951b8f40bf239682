//! Query parameter structs for listing and search endpoints

use crate::notes::{
    CategoryRegistry, ExperimentFilter, MatchMode, NodePredicate, NoteError, PathMatch,
};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Deserialize an optional query value, treating an empty string as absent
fn deserialize_option_from_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    use serde::de::Error;
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if !s.trim().is_empty() => s.trim().parse().map(Some).map_err(D::Error::custom),
        _ => Ok(None),
    }
}

/// Query parameters for `GET /api/experiments`
#[derive(Debug, Deserialize, Default)]
pub struct ListExperimentsQuery {
    #[serde(default, deserialize_with = "deserialize_option_from_str")]
    pub project_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_from_str")]
    pub folder_path: Option<String>,
    /// `exact` or `prefix` (default)
    #[serde(default, rename = "match")]
    pub path_match: PathMatch,
    /// Substance search text; when present the other filters are ignored
    #[serde(default, deserialize_with = "deserialize_option_from_str")]
    pub q: Option<String>,
}

impl ListExperimentsQuery {
    pub fn to_filter(&self) -> Result<ExperimentFilter, NoteError> {
        let project_name = self
            .project_name
            .clone()
            .ok_or_else(|| NoteError::validation("project_name is required"))?;
        Ok(ExperimentFilter {
            project_name,
            folder_path: self.folder_path.clone(),
            path_match: self.path_match,
        })
    }
}

/// Query parameters for `GET /api/search/nodes`
#[derive(Debug, Deserialize)]
pub struct NodeSearchQuery {
    #[serde(default, deserialize_with = "deserialize_option_from_str")]
    pub category: Option<String>,
    pub property: String,
    pub value: String,
    #[serde(default)]
    pub mode: MatchMode,
}

impl NodeSearchQuery {
    pub fn to_predicate(&self) -> Result<NodePredicate, NoteError> {
        let property = self.property.trim();
        if property.is_empty() {
            return Err(NoteError::validation("property must not be empty"));
        }
        Ok(NodePredicate {
            category: self
                .category
                .as_deref()
                .map(CategoryRegistry::resolve)
                .transpose()?,
            property: property.to_string(),
            value: self.value.clone(),
            mode: self.mode,
        })
    }
}
