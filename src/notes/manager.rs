//! Note Manager - the operations exposed to the API layer
//!
//! Bundles the writer, reader and search queries over one injected graph
//! store. Writes answer with the stored shape by reading the experiment back.

use super::error::NoteResult;
use super::models::*;
use super::reader::ExperimentReader;
use super::search::SearchIndexQueries;
use super::writer::ExperimentWriter;
use crate::neo4j::GraphStore;
use std::sync::Arc;
use uuid::Uuid;

/// Manager for experiment note operations
pub struct NoteManager {
    writer: ExperimentWriter,
    reader: ExperimentReader,
    search: SearchIndexQueries,
}

impl NoteManager {
    /// Create a new NoteManager
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            writer: ExperimentWriter::new(store.clone()),
            reader: ExperimentReader::new(store.clone()),
            search: SearchIndexQueries::new(store),
        }
    }

    // ========================================================================
    // Experiments
    // ========================================================================

    pub async fn create_experiment(
        &self,
        request: &ExperimentRequest,
    ) -> NoteResult<ExperimentDetails> {
        let id = self.writer.create(request).await?;
        self.reader.get(id).await
    }

    pub async fn get_experiment(&self, id: Uuid) -> NoteResult<ExperimentDetails> {
        self.reader.get(id).await
    }

    pub async fn update_experiment(
        &self,
        id: Uuid,
        request: &ExperimentRequest,
    ) -> NoteResult<ExperimentDetails> {
        self.writer.update(id, request).await?;
        self.reader.get(id).await
    }

    pub async fn delete_experiment(&self, id: Uuid) -> NoteResult<()> {
        self.writer.delete(id).await
    }

    // ========================================================================
    // Browsing / search
    // ========================================================================

    pub async fn list_projects(&self) -> NoteResult<Vec<String>> {
        self.search.list_projects().await
    }

    pub async fn folder_tree(&self, project_name: &str) -> NoteResult<Vec<FolderEntry>> {
        self.search.folder_tree(project_name).await
    }

    pub async fn list_experiments(
        &self,
        filter: &ExperimentFilter,
    ) -> NoteResult<Vec<ExperimentSummary>> {
        self.search.list_experiments(filter).await
    }

    pub async fn search_substances(&self, query: &str) -> NoteResult<Vec<ExperimentSummary>> {
        self.search.search_substances(query).await
    }

    pub async fn find_experiments(
        &self,
        predicate: &NodePredicate,
    ) -> NoteResult<Vec<ExperimentSummary>> {
        self.search.find_experiments(predicate).await
    }
}
