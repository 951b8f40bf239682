//! API handlers for experiment notes, projects and search

use super::extractor::{ApiJson, ApiPath, ApiQuery};
use super::handlers::{ApiState, AppError};
use super::query::{ListExperimentsQuery, NodeSearchQuery};
use crate::notes::{ExperimentDetails, ExperimentRequest, ExperimentSummary, FolderEntry};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

// ============================================================================
// Projects
// ============================================================================

/// List all project names
pub async fn list_projects(State(state): State<ApiState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.notes.list_projects().await?))
}

/// Folder tree of a project
pub async fn get_folder_tree(
    State(state): State<ApiState>,
    ApiPath(project): ApiPath<String>,
) -> Result<Json<Vec<FolderEntry>>, AppError> {
    Ok(Json(state.notes.folder_tree(&project).await?))
}

// ============================================================================
// Experiments
// ============================================================================

/// List experiments of a project, or search by substance when `q` is given
pub async fn list_experiments(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<ListExperimentsQuery>,
) -> Result<Json<Vec<ExperimentSummary>>, AppError> {
    let summaries = match &query.q {
        Some(text) => state.notes.search_substances(text).await?,
        None => state.notes.list_experiments(&query.to_filter()?).await?,
    };
    Ok(Json(summaries))
}

/// Create an experiment note
pub async fn create_experiment(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<ExperimentRequest>,
) -> Result<(StatusCode, Json<ExperimentDetails>), AppError> {
    let details = state.notes.create_experiment(&req).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// Get an experiment with its flowchart
pub async fn get_experiment(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ExperimentDetails>, AppError> {
    Ok(Json(state.notes.get_experiment(id).await?))
}

/// Replace an experiment note
pub async fn update_experiment(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ExperimentRequest>,
) -> Result<Json<ExperimentDetails>, AppError> {
    Ok(Json(state.notes.update_experiment(id, &req).await?))
}

/// Delete an experiment note
pub async fn delete_experiment(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.notes.delete_experiment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Search
// ============================================================================

/// Experiments owning a node that matches an attribute predicate
pub async fn search_nodes(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<NodeSearchQuery>,
) -> Result<Json<Vec<ExperimentSummary>>, AppError> {
    let predicate = query.to_predicate()?;
    Ok(Json(state.notes.find_experiments(&predicate).await?))
}
