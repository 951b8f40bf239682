//! Neo4j client for the experiment notes graph

use super::bolt::node_properties;
use super::models::*;
use super::txn::Neo4jTxn;
use crate::notes::{
    folder_segments, normalize_folder_path, ExperimentFilter, MatchMode, NodePredicate, NoteError,
    PathMatch,
};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use neo4rs::{query, Graph, Query};
use std::sync::Arc;
use uuid::Uuid;

/// Client for Neo4j operations
pub struct Neo4jClient {
    graph: Arc<Graph>,
}

impl Neo4jClient {
    /// Connect to Neo4j and make sure the schema exists.
    ///
    /// Fails fast with a configuration error when no password is configured
    /// or the server does not answer.
    pub async fn new(uri: &str, user: &str, password: &str) -> Result<Self, NoteError> {
        if password.is_empty() {
            return Err(NoteError::Configuration(
                "Neo4j password is not configured (set NEO4J_PASSWORD)".to_string(),
            ));
        }

        let graph = Graph::new(uri, user, password).await.map_err(|e| {
            NoteError::Configuration(format!("Failed to connect to Neo4j at {}: {}", uri, e))
        })?;

        let client = Self {
            graph: Arc::new(graph),
        };

        if let Some(err) = unreachable_error(uri, client.health_check().await) {
            return Err(err);
        }

        client.init_schema().await?;

        Ok(client)
    }

    /// Initialize constraints and indexes
    pub async fn init_schema(&self) -> Result<()> {
        let constraints = vec![
            "CREATE CONSTRAINT project_name IF NOT EXISTS FOR (p:Project) REQUIRE p.name IS UNIQUE",
            "CREATE CONSTRAINT experiment_id IF NOT EXISTS FOR (e:Experiment) REQUIRE e.id IS UNIQUE",
        ];

        let indexes = vec![
            "CREATE INDEX folder_name IF NOT EXISTS FOR (f:Folder) ON (f.name)",
            "CREATE INDEX experiment_date IF NOT EXISTS FOR (e:Experiment) ON (e.registration_date)",
            "CREATE INDEX experiment_project IF NOT EXISTS FOR (e:Experiment) ON (e.project_name)",
            "CREATE INDEX substances_cas IF NOT EXISTS FOR (s:Substances) ON (s.`CAS RN`)",
            "CREATE INDEX substances_owner IF NOT EXISTS FOR (s:Substances) ON (s.experiment_id)",
            "CREATE INDEX processing_owner IF NOT EXISTS FOR (n:Processing) ON (n.experiment_id)",
            "CREATE INDEX measurement_owner IF NOT EXISTS FOR (n:Measurement) ON (n.experiment_id)",
            "CREATE INDEX others_owner IF NOT EXISTS FOR (n:Others) ON (n.experiment_id)",
        ];

        for constraint in constraints {
            if let Err(e) = self.graph.run(query(constraint)).await {
                tracing::warn!("Constraint may already exist: {}", e);
            }
        }

        for index in indexes {
            if let Err(e) = self.graph.run(query(index)).await {
                tracing::warn!("Index may already exist: {}", e);
            }
        }

        Ok(())
    }

    /// Execute a parameterized Cypher query outside any transaction
    pub(crate) async fn execute_with_params(&self, q: Query) -> Result<Vec<neo4rs::Row>> {
        let mut result = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Open an explicit transaction
    pub async fn begin(&self) -> Result<Neo4jTxn> {
        let txn = self
            .graph
            .start_txn()
            .await
            .context("Failed to start transaction")?;
        Ok(Neo4jTxn::new(txn))
    }

    pub async fn health_check(&self) -> Result<bool> {
        let rows = self.execute_with_params(query("RETURN 1 AS ok")).await?;
        Ok(!rows.is_empty())
    }

    // ========================================================================
    // Experiment operations
    // ========================================================================

    fn node_to_experiment(&self, node: &neo4rs::Node) -> Result<ExperimentRecord> {
        let id: String = node.get("id")?;
        let date: String = node.get("registration_date")?;
        Ok(ExperimentRecord {
            id: Uuid::parse_str(&id).with_context(|| format!("Invalid experiment id '{}'", id))?,
            name: node.get("name").unwrap_or_default(),
            registrant: node.get("registrant").unwrap_or_default(),
            registration_date: date
                .parse::<NaiveDate>()
                .with_context(|| format!("Invalid registration date '{}'", date))?,
            project_name: node.get("project_name").unwrap_or_default(),
            folder_path: node
                .get::<String>("folder_path")
                .map(|p| normalize_folder_path(&p))
                .unwrap_or_else(|_| "/".to_string()),
        })
    }

    fn rows_to_experiments(&self, rows: Vec<neo4rs::Row>) -> Result<Vec<ExperimentRecord>> {
        rows.iter()
            .map(|row| -> Result<ExperimentRecord> {
                let node: neo4rs::Node = row.get("e")?;
                self.node_to_experiment(&node)
            })
            .collect()
    }

    /// Get an experiment and the project above it
    pub async fn get_experiment(&self, id: Uuid) -> Result<Option<ExperimentHeader>> {
        let q = query(
            r#"
            MATCH (e:Experiment {id: $id})
            OPTIONAL MATCH (p:Project)-[:CONTAINS*]->(e)
            RETURN e,
                   coalesce(p.name, '') AS project_name,
                   coalesce(elementId(p), '') AS project_id
            LIMIT 1
            "#,
        )
        .param("id", id.to_string());

        let rows = self.execute_with_params(q).await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        let node: neo4rs::Node = row.get("e")?;
        let record = self.node_to_experiment(&node)?;
        let project_name: String = row.get("project_name")?;
        let project_id: String = row.get("project_id")?;
        let project = (!project_name.is_empty()).then(|| ProjectRef {
            element_id: project_id,
            name: project_name,
        });

        Ok(Some(ExperimentHeader { record, project }))
    }

    /// Get the nodes an experiment contains
    pub async fn get_experiment_nodes(&self, id: Uuid) -> Result<Vec<StoredNode>> {
        let q = query(
            r#"
            MATCH (:Experiment {id: $id})-[:CONTAINS]->(n)
            RETURN n, elementId(n) AS element_id
            "#,
        )
        .param("id", id.to_string());

        let rows = self.execute_with_params(q).await?;
        rows.iter()
            .map(|row| -> Result<StoredNode> {
                let node: neo4rs::Node = row.get("n")?;
                Ok(StoredNode {
                    element_id: row.get("element_id")?,
                    labels: node.labels().into_iter().map(String::from).collect(),
                    properties: node_properties(&node),
                })
            })
            .collect()
    }

    /// Get every relationship leaving an experiment's nodes
    pub async fn get_experiment_relationships(&self, id: Uuid) -> Result<Vec<StoredRelationship>> {
        let q = query(
            r#"
            MATCH (:Experiment {id: $id})-[:CONTAINS]->(a)-[r]->(b)
            RETURN elementId(a) AS start_id, elementId(b) AS end_id, type(r) AS rel_type
            "#,
        )
        .param("id", id.to_string());

        let rows = self.execute_with_params(q).await?;
        rows.iter()
            .map(|row| -> Result<StoredRelationship> {
                Ok(StoredRelationship {
                    start_element_id: row.get("start_id")?,
                    end_element_id: row.get("end_id")?,
                    rel_type: row.get("rel_type")?,
                })
            })
            .collect()
    }

    // ========================================================================
    // Hierarchy / search
    // ========================================================================

    /// List all project names
    pub async fn list_projects(&self) -> Result<Vec<String>> {
        let rows = self
            .execute_with_params(query(
                "MATCH (p:Project) RETURN p.name AS name ORDER BY name",
            ))
            .await?;
        rows.iter()
            .map(|row| row.get::<String>("name").map_err(|e| anyhow!(e)))
            .collect()
    }

    /// List every folder chain of a project
    pub async fn list_folder_paths(&self, project_name: &str) -> Result<Vec<Vec<String>>> {
        let q = query(
            r#"
            MATCH path = (:Project {name: $name})-[:CONTAINS*1..]->(f:Folder)
            WHERE all(x IN tail(nodes(path)) WHERE x:Folder)
            RETURN [x IN tail(nodes(path)) | x.name] AS segments
            "#,
        )
        .param("name", project_name);

        let rows = self.execute_with_params(q).await?;
        rows.iter()
            .map(|row| row.get::<Vec<String>>("segments").map_err(|e| anyhow!(e)))
            .collect()
    }

    /// List experiments of a project, newest first
    pub async fn list_experiments(&self, filter: &ExperimentFilter) -> Result<Vec<ExperimentRecord>> {
        let path = filter.folder_path.as_deref().map(normalize_folder_path);
        let condition = match (&path, filter.path_match) {
            (None, _) => "",
            (Some(p), PathMatch::Prefix) if folder_segments(p).is_empty() => "",
            (Some(_), PathMatch::Exact) => "WHERE e.folder_path = $path",
            (Some(_), PathMatch::Prefix) => {
                "WHERE e.folder_path = $path OR e.folder_path STARTS WITH $path + '/'"
            }
        };

        let cypher = format!(
            r#"
            MATCH (:Project {{name: $project}})-[:CONTAINS*]->(e:Experiment)
            {}
            RETURN DISTINCT e
            ORDER BY e.registration_date DESC, e.name
            "#,
            condition
        );
        let q = query(&cypher)
            .param("project", filter.project_name.clone())
            .param("path", path.unwrap_or_else(|| "/".to_string()));

        let rows = self.execute_with_params(q).await?;
        self.rows_to_experiments(rows)
    }

    /// Find experiments owning a node that matches the predicate
    pub async fn find_experiments_by_node(
        &self,
        predicate: &NodePredicate,
    ) -> Result<Vec<ExperimentRecord>> {
        let pattern = match predicate.category {
            Some(category) => format!("(n:{})", category.label()),
            None => "(n)".to_string(),
        };
        let test = match predicate.mode {
            MatchMode::Exact => "= $value",
            MatchMode::Contains => "CONTAINS $value",
        };
        // toString() rejects lists, so list properties match element-wise
        let comparison = format!(
            "CASE WHEN n[$property] IS :: LIST<ANY> \
             THEN any(x IN n[$property] WHERE toString(x) {test}) \
             ELSE toString(n[$property]) {test} END"
        );

        let cypher = format!(
            r#"
            MATCH (e:Experiment)-[:CONTAINS]->{pattern}
            WHERE n[$property] IS NOT NULL AND {comparison}
            RETURN DISTINCT e
            ORDER BY e.registration_date DESC, e.name
            "#
        );
        let q = query(&cypher)
            .param("property", predicate.property.clone())
            .param("value", predicate.value.clone());

        let rows = self.execute_with_params(q).await?;
        self.rows_to_experiments(rows)
    }
}

/// Configuration error for a health check that did not succeed
fn unreachable_error(uri: &str, health: Result<bool>) -> Option<NoteError> {
    match health {
        Ok(true) => None,
        Ok(false) => Some(NoteError::Configuration(format!(
            "Neo4j at {} did not answer the health check",
            uri
        ))),
        Err(e) => Some(NoteError::Configuration(format!(
            "Neo4j at {} is not reachable: {:#}",
            uri, e
        ))),
    }
}
