//! Postgres-backed registry implementation.
//!
//! Runtime sqlx queries with an explicit column list, like the rest of
//! the platform's repositories. `update_status` runs the transition check
//! inside a transaction with `SELECT ... FOR UPDATE`, so concurrent
//! updates for the same job id serialize at the row lock and no update is
//! lost.

use arcus_core::types::{JobId, Timestamp, UserId};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use crate::models::{ErrorDetail, Job, JobListQuery, StatusUpdate};
use crate::status::JobStatus;
use crate::{JobRegistry, OwnerScope, RegistryError};

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, owner_id, title, description, process, api_version, status_id, \
    handle, progress, usage, costs, error, \
    created, updated, started, finished";

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Apply pending migrations from the crate's `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Cheap connectivity check for startup and health endpoints.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Registry backed by a Postgres `jobs` table.
pub struct PgJobRegistry {
    pool: PgPool,
}

impl PgJobRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// A row from the `jobs` table, before decoding into the domain [`Job`].
#[derive(Debug, FromRow)]
struct JobRow {
    id: String,
    owner_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    process: serde_json::Value,
    api_version: String,
    status_id: i16,
    handle: Option<String>,
    progress: Option<i16>,
    usage: Option<serde_json::Value>,
    costs: Option<serde_json::Value>,
    error: Option<serde_json::Value>,
    created: Timestamp,
    updated: Timestamp,
    started: Option<Timestamp>,
    finished: Option<Timestamp>,
}

fn decode_json<T: serde::de::DeserializeOwned>(
    value: Option<serde_json::Value>,
) -> Result<Option<T>, sqlx::Error> {
    value
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

impl TryFrom<JobRow> for Job {
    type Error = sqlx::Error;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::from_id(row.status_id).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown status id {}", row.status_id).into())
        })?;
        Ok(Job {
            id: JobId::from(row.id),
            owner: row.owner_id.map(UserId::from),
            title: row.title,
            description: row.description,
            process: row.process.into(),
            api_version: row.api_version.into(),
            status,
            handle: row.handle.map(Into::into),
            progress: row.progress,
            usage: decode_json(row.usage)?,
            costs: decode_json(row.costs)?,
            error: decode_json::<ErrorDetail>(row.error)?,
            created: row.created,
            updated: row.updated,
            started: row.started,
            finished: row.finished,
        })
    }
}

fn encode_json<T: serde::Serialize>(
    value: &Option<T>,
) -> Result<Option<serde_json::Value>, RegistryError> {
    value
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| RegistryError::Database(sqlx::Error::Encode(Box::new(e))))
}

#[async_trait]
impl JobRegistry for PgJobRegistry {
    async fn create(&self, job: Job) -> Result<JobId, RegistryError> {
        let result = sqlx::query(
            "INSERT INTO jobs \
                 (id, owner_id, title, description, process, api_version, status_id, \
                  created, updated) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(job.id.as_str())
        .bind(job.owner.as_ref().map(UserId::as_str))
        .bind(&job.title)
        .bind(&job.description)
        .bind(job.process.as_value())
        .bind(job.api_version.as_str())
        .bind(job.status.id())
        .bind(job.created)
        .bind(job.updated)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RegistryError::DuplicateId(job.id));
        }
        Ok(job.id)
    }

    async fn get(&self, id: &JobId) -> Result<Job, RegistryError> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        let row = sqlx::query_as::<_, JobRow>(&query)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        Ok(Job::try_from(row)?)
    }

    async fn list(
        &self,
        scope: OwnerScope<'_>,
        params: &JobListQuery,
    ) -> Result<Vec<Job>, RegistryError> {
        // Build the WHERE clause and track the next bind parameter index.
        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        match scope {
            OwnerScope::Any => {}
            OwnerScope::Anonymous => conditions.push("owner_id IS NULL".to_string()),
            OwnerScope::User(_) => {
                conditions.push(format!("owner_id = ${bind_idx}"));
                bind_idx += 1;
            }
        }
        if params.status.is_some() {
            conditions.push(format!("status_id = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             {where_clause} \
             ORDER BY created DESC, id ASC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, JobRow>(&query);
        if let OwnerScope::User(user) = scope {
            q = q.bind(user.as_str());
        }
        if let Some(status) = params.status {
            q = q.bind(status.id());
        }
        q = q.bind(params.effective_limit()).bind(params.effective_offset());

        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| Job::try_from(row).map_err(RegistryError::from))
            .collect()
    }

    async fn update_status(
        &self,
        id: &JobId,
        new_status: JobStatus,
        update: StatusUpdate,
    ) -> Result<Job, RegistryError> {
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, JobRow>(&query)
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        let mut job = Job::try_from(row)?;
        job.apply(new_status, update, chrono::Utc::now())?;

        sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, handle = $3, progress = $4, usage = $5, \
                 costs = $6, error = $7, updated = $8, started = $9, finished = $10 \
             WHERE id = $1",
        )
        .bind(job.id.as_str())
        .bind(job.status.id())
        .bind(job.handle.as_ref().map(|h| h.as_str()))
        .bind(job.progress)
        .bind(encode_json(&job.usage)?)
        .bind(encode_json(&job.costs)?)
        .bind(encode_json(&job.error)?)
        .bind(job.updated)
        .bind(job.started)
        .bind(job.finished)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(job)
    }

    async fn delete(&self, id: &JobId) -> Result<(), RegistryError> {
        // Idempotent: zero rows affected is still a success.
        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
