//! Shared state for bulk uploads and their background submission jobs.
//!
//! - `UploadsState`: every upload session the server knows about, keyed by
//!   upload id. Each session carries its own submission gate.
//! - `JobsState`: the status of each submission job, keyed by job id, polled
//!   through `/api/bulk_upload/status/{job_id}`.
//! - `JobUpdate` / `start_job_updater`: blocking submission workers push
//!   progress into an mpsc channel; one long-running task applies it to
//!   `JobsState`, so workers never need the write lock themselves.

use crate::services::bulk_upload::session::UploadSession;
use common::jobs::JobStatus;
use log::info;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::{mpsc, RwLock};

/// A thread-safe, shareable container for the state of all submission jobs.
#[derive(Clone)]
pub struct JobsState {
    /// Job id (UUID) to its latest `JobStatus`.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Sender handed to background workers for progress reports.
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    pub fn new(tx: mpsc::Sender<JobUpdate>) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        }
    }
}

/// Upload sessions by upload id.
#[derive(Clone, Default)]
pub struct UploadsState {
    pub sessions: Arc<RwLock<HashMap<String, UploadSession>>>,
}

impl UploadsState {
    /// Drops sessions untouched for `ttl`, together with the finished job
    /// they point to. Returns how many sessions went.
    pub async fn sweep_stale(&self, jobs: &JobsState, ttl: Duration) -> usize {
        let mut stale_jobs = Vec::new();
        let removed = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, session| {
                let stale = session.is_stale(ttl);
                if stale {
                    stale_jobs.extend(session.job_id.clone());
                }
                !stale
            });
            before - sessions.len()
        };
        if removed == 0 {
            return 0;
        }
        info!("dropped {} stale upload sessions", removed);

        let mut job_statuses = jobs.jobs.write().await;
        for job_id in &stale_jobs {
            if matches!(
                job_statuses.get(job_id),
                Some(JobStatus::Completed(_)) | Some(JobStatus::Failed(_))
            ) {
                job_statuses.remove(job_id);
            }
        }
        removed
    }
}

/// A status update for one submission job.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

/// Applies `JobUpdate`s to `JobsState` until every sender is dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        // a late progress message must not overwrite the final status
        if matches!(
            jobs.get(&update.job_id),
            Some(JobStatus::Completed(_)) | Some(JobStatus::Failed(_))
        ) && matches!(update.status, JobStatus::InProgress(_))
        {
            continue;
        }
        jobs.insert(update.job_id, update.status);
    }
}
