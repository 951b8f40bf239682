//! Folder path handling and idempotent hierarchy resolution
//!
//! A folder path is a slash-delimited string. Leading, trailing and repeated
//! slashes are insignificant and segments are trimmed, so `"/a//b/"`,
//! `"a/b"` and `" a / b "` all name the folder chain `a -> b`.

use super::error::{NoteError, NoteResult};
use crate::neo4j::{AnchorRef, GraphTxn};

/// Non-empty, trimmed segments of a folder path
pub fn folder_segments(path: &str) -> Vec<&str> {
    path.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Canonical rendering of a folder path: `/a/b`, or `/` for the root.
pub fn normalize_folder_path(path: &str) -> String {
    let segments = folder_segments(path);
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// A resolved Project -> Folder* chain
#[derive(Debug, Clone)]
pub struct AnchorChain {
    pub project: AnchorRef,
    pub folders: Vec<AnchorRef>,
}

impl AnchorChain {
    /// Where an experiment filed under this chain hangs
    pub fn deepest(&self) -> &AnchorRef {
        self.folders.last().unwrap_or(&self.project)
    }

    /// Canonical path of the chain
    pub fn path(&self) -> String {
        let names: Vec<&str> = self.folders.iter().map(|f| f.name.as_str()).collect();
        normalize_folder_path(&names.join("/"))
    }
}

/// Merges the project and folder chain of a request inside a transaction.
///
/// Every step is an upsert keyed by (parent, name), so resolving the same
/// path twice yields the same nodes.
pub struct PathResolver;

impl PathResolver {
    pub async fn resolve(
        txn: &mut dyn GraphTxn,
        project_name: &str,
        folder_path: &str,
    ) -> NoteResult<AnchorChain> {
        let project_name = project_name.trim();
        if project_name.is_empty() {
            return Err(NoteError::validation("project name must not be empty"));
        }

        let project = txn.merge_project(project_name).await?;
        let mut folders: Vec<AnchorRef> = Vec::new();
        for segment in folder_segments(folder_path) {
            let parent = folders.last().unwrap_or(&project);
            let folder = txn.merge_folder(parent, segment).await?;
            folders.push(folder);
        }

        tracing::debug!(
            project = project_name,
            depth = folders.len(),
            "Resolved folder chain"
        );
        Ok(AnchorChain { project, folders })
    }
}
