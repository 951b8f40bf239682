//! Read-only traversal helpers: projects, folder trees, experiment listings
//! and attribute searches.
//!
//! Nothing here opens a transaction. No match is an empty result, never an
//! error.

use super::category::NODE_NAME;
use super::error::NoteResult;
use super::models::*;
use super::path::normalize_folder_path;
use crate::neo4j::{ExperimentRecord, GraphStore};
use std::collections::HashSet;
use std::sync::Arc;

/// Property holding a substance's CAS registry number
pub const CAS_RN: &str = "CAS RN";

pub struct SearchIndexQueries {
    store: Arc<dyn GraphStore>,
}

impl SearchIndexQueries {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub async fn list_projects(&self) -> NoteResult<Vec<String>> {
        let mut names = self.store.list_projects().await?;
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Nested folder tree of a project, children sorted by name
    pub async fn folder_tree(&self, project_name: &str) -> NoteResult<Vec<FolderEntry>> {
        let mut paths = self.store.list_folder_paths(project_name).await?;
        paths.sort();

        let mut roots: Vec<FolderEntry> = Vec::new();
        for segments in &paths {
            insert_path(&mut roots, segments, "");
        }
        Ok(roots)
    }

    /// Experiments of a project, newest first
    pub async fn list_experiments(
        &self,
        filter: &ExperimentFilter,
    ) -> NoteResult<Vec<ExperimentSummary>> {
        let filter = ExperimentFilter {
            project_name: filter.project_name.trim().to_string(),
            folder_path: filter.folder_path.as_deref().map(normalize_folder_path),
            path_match: filter.path_match,
        };
        let records = self.store.list_experiments(&filter).await?;
        Ok(summarize(records))
    }

    /// Experiments owning a node that satisfies `predicate`, newest first
    pub async fn find_experiments(
        &self,
        predicate: &NodePredicate,
    ) -> NoteResult<Vec<ExperimentSummary>> {
        let records = self.store.find_experiments_by_node(predicate).await?;
        Ok(summarize(records))
    }

    /// Experiments using a substance, matched by exact CAS RN or by a
    /// fragment of its name
    pub async fn search_substances(&self, query: &str) -> NoteResult<Vec<ExperimentSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(vec![]);
        }

        let mut records = self
            .store
            .find_experiments_by_node(&NodePredicate::exact(Category::Substances, CAS_RN, query))
            .await?;
        records.extend(
            self.store
                .find_experiments_by_node(&NodePredicate::contains(
                    Category::Substances,
                    NODE_NAME,
                    query,
                ))
                .await?,
        );
        tracing::debug!(query, hits = records.len(), "Substance search");
        Ok(summarize(records))
    }
}

/// De-duplicate and order by registration date (newest first), then name
fn summarize(records: Vec<ExperimentRecord>) -> Vec<ExperimentSummary> {
    let mut seen = HashSet::new();
    let mut summaries: Vec<ExperimentSummary> = records
        .iter()
        .filter(|r| seen.insert(r.id))
        .map(ExperimentRecord::summary)
        .collect();
    summaries.sort_by(|a, b| {
        b.registration_date
            .cmp(&a.registration_date)
            .then_with(|| a.name.cmp(&b.name))
    });
    summaries
}

fn insert_path(level: &mut Vec<FolderEntry>, segments: &[String], parent_path: &str) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    let index = match level.iter().position(|e| &e.name == head) {
        Some(i) => i,
        None => {
            level.push(FolderEntry {
                name: head.clone(),
                path: format!("{}/{}", parent_path, head),
                children: Vec::new(),
            });
            level.sort_by(|a, b| a.name.cmp(&b.name));
            level.iter().position(|e| &e.name == head).unwrap_or(0)
        }
    };
    let entry = &mut level[index];
    let path = entry.path.clone();
    insert_path(&mut entry.children, rest, &path);
}
