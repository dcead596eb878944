//! In-memory registry implementation.
//!
//! Backs tests and single-node demo deployments. A `tokio::sync::RwLock`
//! over the job map serializes mutations: the transition check and the
//! field updates happen under one write-lock acquisition, which gives the
//! no-lost-update guarantee the registry contract requires.

use std::collections::HashMap;

use arcus_core::types::JobId;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{Job, JobListQuery, StatusUpdate};
use crate::status::JobStatus;
use crate::{JobRegistry, OwnerScope, RegistryError};

/// Registry keeping all job records in process memory.
#[derive(Default)]
pub struct InMemoryRegistry {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobRegistry for InMemoryRegistry {
    async fn create(&self, job: Job) -> Result<JobId, RegistryError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(RegistryError::DuplicateId(job.id.clone()));
        }
        let id = job.id.clone();
        jobs.insert(id.clone(), job);
        Ok(id)
    }

    async fn get(&self, id: &JobId) -> Result<Job, RegistryError> {
        self.jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    async fn list(
        &self,
        scope: OwnerScope<'_>,
        query: &JobListQuery,
    ) -> Result<Vec<Job>, RegistryError> {
        let jobs = self.jobs.read().await;
        let mut matching: Vec<Job> = jobs
            .values()
            .filter(|job| scope.matches(job.owner.as_ref()))
            .filter(|job| query.status.map_or(true, |status| job.status == status))
            .cloned()
            .collect();
        // Creation time descending; id as tiebreaker for a stable page order.
        matching.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.id.as_str().cmp(b.id.as_str())));

        let offset = query.effective_offset() as usize;
        let limit = query.effective_limit() as usize;
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn update_status(
        &self,
        id: &JobId,
        new_status: JobStatus,
        update: StatusUpdate,
    ) -> Result<Job, RegistryError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        job.apply(new_status, update, chrono::Utc::now())?;
        Ok(job.clone())
    }

    async fn delete(&self, id: &JobId) -> Result<(), RegistryError> {
        self.jobs.write().await.remove(id);
        Ok(())
    }
}
