//! `GraphTxn` over a Neo4j explicit transaction

use super::bolt::properties_to_bolt;
use super::models::*;
use super::traits::GraphTxn;
use crate::notes::FlowEdge;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use neo4rs::{query, Query, Row, Txn};
use uuid::Uuid;

/// One open Neo4j transaction. Becomes inert after commit or rollback.
pub struct Neo4jTxn {
    txn: Option<Txn>,
}

impl Neo4jTxn {
    pub(crate) fn new(txn: Txn) -> Self {
        Self { txn: Some(txn) }
    }

    fn open(&mut self) -> Result<&mut Txn> {
        self.txn
            .as_mut()
            .ok_or_else(|| anyhow!("Transaction already finished"))
    }

    /// Execute a statement and collect its rows
    async fn fetch(&mut self, q: Query) -> Result<Vec<Row>> {
        let txn = self.open()?;
        let mut stream = txn.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next(txn.handle()).await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a statement expected to return one row
    async fn fetch_one(&mut self, q: Query) -> Result<Option<Row>> {
        Ok(self.fetch(q).await?.into_iter().next())
    }

    fn anchor_from_row(row: &Row, kind: AnchorKind, name: &str) -> Result<AnchorRef> {
        Ok(AnchorRef {
            kind,
            element_id: row.get("element_id")?,
            name: name.to_string(),
        })
    }
}

#[async_trait]
impl GraphTxn for Neo4jTxn {
    async fn merge_project(&mut self, name: &str) -> Result<AnchorRef> {
        let q = query(
            r#"
            MERGE (p:Project {name: $name})
            RETURN elementId(p) AS element_id
            "#,
        )
        .param("name", name);

        let row = self
            .fetch_one(q)
            .await
            .context("Failed to merge project")?
            .ok_or_else(|| anyhow!("MERGE returned no project row"))?;
        Self::anchor_from_row(&row, AnchorKind::Project, name)
    }

    async fn merge_folder(&mut self, parent: &AnchorRef, name: &str) -> Result<AnchorRef> {
        // Label comes from a closed enum, never from input
        let cypher = format!(
            r#"
            MATCH (parent:{label}) WHERE elementId(parent) = $parent_id
            MERGE (parent)-[:CONTAINS]->(f:Folder {{name: $name}})
            RETURN elementId(f) AS element_id
            "#,
            label = parent.kind.label()
        );
        let q = query(&cypher)
            .param("parent_id", parent.element_id.clone())
            .param("name", name);

        let row = self
            .fetch_one(q)
            .await
            .with_context(|| format!("Failed to merge folder '{}'", name))?
            .ok_or_else(|| anyhow!("Parent {} '{}' vanished", parent.kind.label(), parent.name))?;
        Self::anchor_from_row(&row, AnchorKind::Folder, name)
    }

    async fn create_experiment(
        &mut self,
        parent: &AnchorRef,
        record: &ExperimentRecord,
    ) -> Result<()> {
        let cypher = format!(
            r#"
            MATCH (parent:{label}) WHERE elementId(parent) = $parent_id
            CREATE (parent)-[:CONTAINS]->(e:Experiment {{
                id: $id,
                name: $name,
                registrant: $registrant,
                registration_date: $registration_date,
                project_name: $project_name,
                folder_path: $folder_path
            }})
            RETURN e.id AS id
            "#,
            label = parent.kind.label()
        );
        let q = query(&cypher)
            .param("parent_id", parent.element_id.clone())
            .param("id", record.id.to_string())
            .param("name", record.name.clone())
            .param("registrant", record.registrant.clone())
            .param("registration_date", record.registration_date.to_string())
            .param("project_name", record.project_name.clone())
            .param("folder_path", record.folder_path.clone());

        self.fetch_one(q)
            .await
            .context("Failed to create experiment")?
            .ok_or_else(|| anyhow!("Parent {} '{}' vanished", parent.kind.label(), parent.name))?;
        Ok(())
    }

    async fn update_experiment(&mut self, record: &ExperimentRecord) -> Result<bool> {
        let q = query(
            r#"
            MATCH (e:Experiment {id: $id})
            SET e.name = $name,
                e.registrant = $registrant,
                e.registration_date = $registration_date,
                e.project_name = $project_name,
                e.folder_path = $folder_path
            RETURN count(e) AS updated
            "#,
        )
        .param("id", record.id.to_string())
        .param("name", record.name.clone())
        .param("registrant", record.registrant.clone())
        .param("registration_date", record.registration_date.to_string())
        .param("project_name", record.project_name.clone())
        .param("folder_path", record.folder_path.clone());

        let updated: i64 = match self.fetch_one(q).await.context("Failed to update experiment")? {
            Some(row) => row.get("updated")?,
            None => 0,
        };
        Ok(updated > 0)
    }

    async fn relink_experiment(&mut self, parent: &AnchorRef, experiment_id: Uuid) -> Result<()> {
        let unlink = query(
            r#"
            MATCH (old)-[r:CONTAINS]->(e:Experiment {id: $id})
            WHERE old:Project OR old:Folder
            DELETE r
            "#,
        )
        .param("id", experiment_id.to_string());
        self.fetch(unlink)
            .await
            .context("Failed to unlink experiment from its parent")?;

        let cypher = format!(
            r#"
            MATCH (parent:{label}) WHERE elementId(parent) = $parent_id
            MATCH (e:Experiment {{id: $id}})
            MERGE (parent)-[:CONTAINS]->(e)
            "#,
            label = parent.kind.label()
        );
        let link = query(&cypher)
            .param("parent_id", parent.element_id.clone())
            .param("id", experiment_id.to_string());
        self.fetch(link)
            .await
            .context("Failed to link experiment to its parent")?;
        Ok(())
    }

    async fn delete_flow_nodes(&mut self, experiment_id: Uuid) -> Result<u64> {
        let q = query(
            r#"
            MATCH (e:Experiment {id: $id})-[:CONTAINS]->(n)
            DETACH DELETE n
            RETURN count(n) AS deleted
            "#,
        )
        .param("id", experiment_id.to_string());

        let deleted: i64 = match self.fetch_one(q).await.context("Failed to delete flow nodes")? {
            Some(row) => row.get("deleted")?,
            None => 0,
        };
        Ok(deleted.max(0) as u64)
    }

    async fn merge_flow_node(&mut self, experiment_id: Uuid, node: &FlowNodeWrite) -> Result<()> {
        let cypher = format!(
            r#"
            MATCH (e:Experiment {{id: $experiment_id}})
            MERGE (n:{label} {{id: $id, experiment_id: $experiment_id}})
            SET n += $props
            MERGE (e)-[:CONTAINS]->(n)
            RETURN n.id AS id
            "#,
            label = node.category.label()
        );
        let q = query(&cypher)
            .param("experiment_id", experiment_id.to_string())
            .param("id", node.id.clone())
            .param("props", properties_to_bolt(&node.properties));

        self.fetch_one(q)
            .await
            .with_context(|| format!("Failed to merge node '{}'", node.id))?
            .ok_or_else(|| anyhow!("Experiment {} vanished", experiment_id))?;
        Ok(())
    }

    async fn merge_flow_edge(&mut self, experiment_id: Uuid, edge: &FlowEdge) -> Result<()> {
        let cypher = format!(
            r#"
            MATCH (e:Experiment {{id: $experiment_id}})-[:CONTAINS]->(a {{id: $source_id}})
            MATCH (e)-[:CONTAINS]->(b {{id: $target_id}})
            MERGE (a)-[:{rel_type}]->(b)
            "#,
            rel_type = quote_identifier(&edge.edge_type)
        );
        let q = query(&cypher)
            .param("experiment_id", experiment_id.to_string())
            .param("source_id", edge.source_id.clone())
            .param("target_id", edge.target_id.clone());

        self.fetch(q).await.with_context(|| {
            format!(
                "Failed to create edge {} -[{}]-> {}",
                edge.source_id, edge.edge_type, edge.target_id
            )
        })?;
        Ok(())
    }

    async fn delete_experiment(&mut self, experiment_id: Uuid) -> Result<u64> {
        let q = query(
            r#"
            MATCH (e:Experiment {id: $id})
            OPTIONAL MATCH (e)-[:CONTAINS]->(n)
            WITH e, collect(n) AS owned
            DETACH DELETE e
            FOREACH (x IN owned | DETACH DELETE x)
            RETURN 1 + size(owned) AS deleted
            "#,
        )
        .param("id", experiment_id.to_string());

        let deleted: i64 = match self
            .fetch_one(q)
            .await
            .context("Failed to delete experiment")?
        {
            Some(row) => row.get("deleted")?,
            None => 0,
        };
        Ok(deleted.max(0) as u64)
    }

    async fn commit(&mut self) -> Result<()> {
        let txn = self
            .txn
            .take()
            .ok_or_else(|| anyhow!("Transaction already finished"))?;
        txn.commit().await.context("Failed to commit transaction")
    }

    async fn rollback(&mut self) -> Result<()> {
        match self.txn.take() {
            Some(txn) => txn.rollback().await.context("Failed to rollback transaction"),
            None => Ok(()),
        }
    }
}
