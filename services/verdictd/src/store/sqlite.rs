//! SQLite implementation of the engine repository contracts.
//!
//! # Purpose
//! Durable single-file backend. Schema creation is idempotent and runs at
//! connect time; the engines replay these tables into their caches at
//! bootstrap.
//!
//! # Consistency
//! Policy triples, role assignments, attributes, and relationship edges
//! each live in one table keyed by their natural identity, so the set
//! semantics of the logical model fall out of primary-key constraints.
//! ABAC policies span two tables (`abac_policies` and
//! `abac_policy_conditions`); their writes are transactional so a policy
//! is never visible with a partial condition list.
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use verdict_engine::error::{EngineError, EngineResult};
use verdict_engine::model::{AbacPolicy, PolicyCondition, PolicyTriple, Relationship, RoleAssignment};
use verdict_engine::repository::{
    AbacPolicyRepository, AclPolicyRepository, AttributeRepository, RbacPolicyRepository,
    RebacRepository,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS acl_policies (
        subject TEXT NOT NULL,
        object TEXT NOT NULL,
        action TEXT NOT NULL,
        PRIMARY KEY (subject, object, action)
    )",
    "CREATE TABLE IF NOT EXISTS rbac_policies (
        subject TEXT NOT NULL,
        object TEXT NOT NULL,
        action TEXT NOT NULL,
        PRIMARY KEY (subject, object, action)
    )",
    "CREATE TABLE IF NOT EXISTS rbac_role_assignments (
        user_id TEXT NOT NULL,
        role TEXT NOT NULL,
        PRIMARY KEY (user_id, role)
    )",
    "CREATE TABLE IF NOT EXISTS abac_policies (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        effect TEXT NOT NULL,
        priority INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS abac_policy_conditions (
        policy_id TEXT NOT NULL,
        position INTEGER NOT NULL,
        condition_type TEXT NOT NULL,
        field TEXT NOT NULL,
        operator TEXT NOT NULL,
        value TEXT NOT NULL,
        logic_op TEXT NOT NULL DEFAULT '',
        PRIMARY KEY (policy_id, position)
    )",
    "CREATE TABLE IF NOT EXISTS user_attributes (
        user_id TEXT NOT NULL,
        attribute TEXT NOT NULL,
        value TEXT NOT NULL,
        PRIMARY KEY (user_id, attribute)
    )",
    "CREATE TABLE IF NOT EXISTS object_attributes (
        object_id TEXT NOT NULL,
        attribute TEXT NOT NULL,
        value TEXT NOT NULL,
        PRIMARY KEY (object_id, attribute)
    )",
    "CREATE TABLE IF NOT EXISTS relationships (
        subject TEXT NOT NULL,
        relationship TEXT NOT NULL,
        object TEXT NOT NULL,
        PRIMARY KEY (subject, relationship, object)
    )",
];

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects to the database and creates any missing tables.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .with_context(|| format!("connect to {url}"))?;
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .context("run schema migration")?;
        }
        Ok(Self { pool })
    }
}

fn storage(err: sqlx::Error) -> EngineError {
    EngineError::Storage(err.into())
}

fn parse_timestamp(raw: &str, column: &str) -> EngineResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| EngineError::Storage(anyhow::anyhow!("parse {column}: {err}")))
}

#[async_trait]
impl AclPolicyRepository for SqliteStore {
    async fn add_policy(&self, subject: &str, object: &str, action: &str) -> EngineResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO acl_policies (subject, object, action) VALUES (?1, ?2, ?3)",
        )
        .bind(subject)
        .bind(object)
        .bind(action)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_policy(
        &self,
        subject: &str,
        object: &str,
        action: &str,
    ) -> EngineResult<bool> {
        let result = sqlx::query(
            "DELETE FROM acl_policies WHERE subject = ?1 AND object = ?2 AND action = ?3",
        )
        .bind(subject)
        .bind(object)
        .bind(action)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_policies(&self) -> EngineResult<Vec<PolicyTriple>> {
        let rows = sqlx::query("SELECT subject, object, action FROM acl_policies")
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        rows.into_iter()
            .map(|row| {
                Ok(PolicyTriple::new(
                    row.try_get::<String, _>("subject").map_err(storage)?,
                    row.try_get::<String, _>("object").map_err(storage)?,
                    row.try_get::<String, _>("action").map_err(storage)?,
                ))
            })
            .collect()
    }
}

#[async_trait]
impl RbacPolicyRepository for SqliteStore {
    async fn add_policy(&self, subject: &str, object: &str, action: &str) -> EngineResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO rbac_policies (subject, object, action) VALUES (?1, ?2, ?3)",
        )
        .bind(subject)
        .bind(object)
        .bind(action)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_policy(
        &self,
        subject: &str,
        object: &str,
        action: &str,
    ) -> EngineResult<bool> {
        let result = sqlx::query(
            "DELETE FROM rbac_policies WHERE subject = ?1 AND object = ?2 AND action = ?3",
        )
        .bind(subject)
        .bind(object)
        .bind(action)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_policies(&self) -> EngineResult<Vec<PolicyTriple>> {
        let rows = sqlx::query("SELECT subject, object, action FROM rbac_policies")
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        rows.into_iter()
            .map(|row| {
                Ok(PolicyTriple::new(
                    row.try_get::<String, _>("subject").map_err(storage)?,
                    row.try_get::<String, _>("object").map_err(storage)?,
                    row.try_get::<String, _>("action").map_err(storage)?,
                ))
            })
            .collect()
    }

    async fn add_role_for_user(&self, user: &str, role: &str) -> EngineResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO rbac_role_assignments (user_id, role) VALUES (?1, ?2)",
        )
        .bind(user)
        .bind(role)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_role_for_user(&self, user: &str, role: &str) -> EngineResult<bool> {
        let result =
            sqlx::query("DELETE FROM rbac_role_assignments WHERE user_id = ?1 AND role = ?2")
                .bind(user)
                .bind(role)
                .execute(&self.pool)
                .await
                .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_role_assignments(&self) -> EngineResult<Vec<RoleAssignment>> {
        let rows = sqlx::query("SELECT user_id, role FROM rbac_role_assignments")
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        rows.into_iter()
            .map(|row| {
                Ok(RoleAssignment::new(
                    row.try_get::<String, _>("user_id").map_err(storage)?,
                    row.try_get::<String, _>("role").map_err(storage)?,
                ))
            })
            .collect()
    }
}

#[async_trait]
impl AbacPolicyRepository for SqliteStore {
    async fn add_policy(&self, policy: &AbacPolicy) -> EngineResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO abac_policies \
             (id, name, description, effect, priority, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&policy.id)
        .bind(&policy.name)
        .bind(&policy.description)
        .bind(&policy.effect)
        .bind(policy.priority)
        .bind(policy.created_at.to_rfc3339())
        .bind(policy.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(storage)?;
        if inserted.rows_affected() == 0 {
            return Err(EngineError::AlreadyExists(format!(
                "abac policy {}",
                policy.id
            )));
        }
        insert_conditions(&mut tx, &policy.id, &policy.conditions).await?;
        tx.commit().await.map_err(storage)?;
        Ok(())
    }

    async fn update_policy(&self, policy: &AbacPolicy) -> EngineResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        let updated = sqlx::query(
            "UPDATE abac_policies \
             SET name = ?2, description = ?3, effect = ?4, priority = ?5, \
                 created_at = ?6, updated_at = ?7 \
             WHERE id = ?1",
        )
        .bind(&policy.id)
        .bind(&policy.name)
        .bind(&policy.description)
        .bind(&policy.effect)
        .bind(policy.priority)
        .bind(policy.created_at.to_rfc3339())
        .bind(policy.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(storage)?;
        if updated.rows_affected() == 0 {
            return Err(EngineError::NotFound(format!("abac policy {}", policy.id)));
        }
        sqlx::query("DELETE FROM abac_policy_conditions WHERE policy_id = ?1")
            .bind(&policy.id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        insert_conditions(&mut tx, &policy.id, &policy.conditions).await?;
        tx.commit().await.map_err(storage)?;
        Ok(())
    }

    async fn remove_policy(&self, policy_id: &str) -> EngineResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        sqlx::query("DELETE FROM abac_policy_conditions WHERE policy_id = ?1")
            .bind(policy_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        let removed = sqlx::query("DELETE FROM abac_policies WHERE id = ?1")
            .bind(policy_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        if removed.rows_affected() == 0 {
            return Err(EngineError::NotFound(format!("abac policy {policy_id}")));
        }
        tx.commit().await.map_err(storage)?;
        Ok(())
    }

    async fn load_policies(&self) -> EngineResult<Vec<AbacPolicy>> {
        let policy_rows = sqlx::query(
            "SELECT id, name, description, effect, priority, created_at, updated_at \
             FROM abac_policies",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut policies = Vec::with_capacity(policy_rows.len());
        for row in policy_rows {
            let id: String = row.try_get("id").map_err(storage)?;
            let condition_rows = sqlx::query(
                "SELECT condition_type, field, operator, value, logic_op \
                 FROM abac_policy_conditions WHERE policy_id = ?1 ORDER BY position",
            )
            .bind(&id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

            let conditions = condition_rows
                .into_iter()
                .map(|condition| {
                    Ok(PolicyCondition {
                        condition_type: condition
                            .try_get::<String, _>("condition_type")
                            .map_err(storage)?,
                        field: condition.try_get::<String, _>("field").map_err(storage)?,
                        operator: condition
                            .try_get::<String, _>("operator")
                            .map_err(storage)?,
                        value: condition.try_get::<String, _>("value").map_err(storage)?,
                        logic_op: condition
                            .try_get::<String, _>("logic_op")
                            .map_err(storage)?,
                    })
                })
                .collect::<EngineResult<Vec<_>>>()?;

            let created_at: String = row.try_get("created_at").map_err(storage)?;
            let updated_at: String = row.try_get("updated_at").map_err(storage)?;
            policies.push(AbacPolicy {
                id,
                name: row.try_get("name").map_err(storage)?,
                description: row.try_get("description").map_err(storage)?,
                effect: row.try_get("effect").map_err(storage)?,
                priority: row.try_get("priority").map_err(storage)?,
                conditions,
                created_at: parse_timestamp(&created_at, "created_at")?,
                updated_at: parse_timestamp(&updated_at, "updated_at")?,
            });
        }
        Ok(policies)
    }
}

async fn insert_conditions(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    policy_id: &str,
    conditions: &[PolicyCondition],
) -> EngineResult<()> {
    for (position, condition) in conditions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO abac_policy_conditions \
             (policy_id, position, condition_type, field, operator, value, logic_op) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(policy_id)
        .bind(position as i64)
        .bind(&condition.condition_type)
        .bind(&condition.field)
        .bind(&condition.operator)
        .bind(&condition.value)
        .bind(&condition.logic_op)
        .execute(&mut **tx)
        .await
        .map_err(storage)?;
    }
    Ok(())
}

#[async_trait]
impl AttributeRepository for SqliteStore {
    async fn set_user_attribute(&self, user: &str, name: &str, value: &str) -> EngineResult<()> {
        sqlx::query(
            "INSERT INTO user_attributes (user_id, attribute, value) VALUES (?1, ?2, ?3) \
             ON CONFLICT(user_id, attribute) DO UPDATE SET value = excluded.value",
        )
        .bind(user)
        .bind(name)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_user_attributes(&self, user: &str) -> EngineResult<HashMap<String, String>> {
        let rows = sqlx::query("SELECT attribute, value FROM user_attributes WHERE user_id = ?1")
            .bind(user)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        rows.into_iter()
            .map(|row| {
                Ok((
                    row.try_get::<String, _>("attribute").map_err(storage)?,
                    row.try_get::<String, _>("value").map_err(storage)?,
                ))
            })
            .collect()
    }

    async fn remove_user_attribute(&self, user: &str, name: &str) -> EngineResult<()> {
        let result =
            sqlx::query("DELETE FROM user_attributes WHERE user_id = ?1 AND attribute = ?2")
                .bind(user)
                .bind(name)
                .execute(&self.pool)
                .await
                .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(EngineError::NotFound(format!(
                "user attribute {name} for {user}"
            )));
        }
        Ok(())
    }

    async fn set_object_attribute(
        &self,
        object: &str,
        name: &str,
        value: &str,
    ) -> EngineResult<()> {
        sqlx::query(
            "INSERT INTO object_attributes (object_id, attribute, value) VALUES (?1, ?2, ?3) \
             ON CONFLICT(object_id, attribute) DO UPDATE SET value = excluded.value",
        )
        .bind(object)
        .bind(name)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn get_object_attributes(&self, object: &str) -> EngineResult<HashMap<String, String>> {
        let rows =
            sqlx::query("SELECT attribute, value FROM object_attributes WHERE object_id = ?1")
                .bind(object)
                .fetch_all(&self.pool)
                .await
                .map_err(storage)?;
        rows.into_iter()
            .map(|row| {
                Ok((
                    row.try_get::<String, _>("attribute").map_err(storage)?,
                    row.try_get::<String, _>("value").map_err(storage)?,
                ))
            })
            .collect()
    }

    async fn remove_object_attribute(&self, object: &str, name: &str) -> EngineResult<()> {
        let result =
            sqlx::query("DELETE FROM object_attributes WHERE object_id = ?1 AND attribute = ?2")
                .bind(object)
                .bind(name)
                .execute(&self.pool)
                .await
                .map_err(storage)?;
        if result.rows_affected() == 0 {
            return Err(EngineError::NotFound(format!(
                "object attribute {name} for {object}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RebacRepository for SqliteStore {
    async fn add_relationship(
        &self,
        subject: &str,
        relationship: &str,
        object: &str,
    ) -> EngineResult<()> {
        // The store deduplicates: the first write wins.
        sqlx::query(
            "INSERT OR IGNORE INTO relationships (subject, relationship, object) \
             VALUES (?1, ?2, ?3)",
        )
        .bind(subject)
        .bind(relationship)
        .bind(object)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn remove_relationship(
        &self,
        subject: &str,
        relationship: &str,
        object: &str,
    ) -> EngineResult<()> {
        sqlx::query(
            "DELETE FROM relationships \
             WHERE subject = ?1 AND relationship = ?2 AND object = ?3",
        )
        .bind(subject)
        .bind(relationship)
        .bind(object)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn load_relationships(&self) -> EngineResult<Vec<Relationship>> {
        let rows = sqlx::query("SELECT subject, relationship, object FROM relationships")
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        rows.into_iter()
            .map(|row| {
                Ok(Relationship::new(
                    row.try_get::<String, _>("subject").map_err(storage)?,
                    row.try_get::<String, _>("relationship").map_err(storage)?,
                    row.try_get::<String, _>("object").map_err(storage)?,
                ))
            })
            .collect()
    }
}
