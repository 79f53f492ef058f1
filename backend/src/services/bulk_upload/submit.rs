//! `POST /api/bulk_upload/submit`
//!
//! Starts the background submission of an upload whose gate is `Ready`. The
//! handler answers immediately with a `job_id`; the batches are written by a
//! `spawn_blocking` worker that reports progress through the job controller
//! channel. When the worker ends, the job status and the upload session are
//! updated, unless the seller cancelled the upload in the meantime.

use crate::catalog::submit::{run_submission, SubmissionJob};
use crate::config::Config;
use crate::job_controller::state::{JobUpdate, JobsState, UploadsState};
use crate::services::bulk_upload::error::ApiError;
use crate::services::bulk_upload::session::find_session;
use crate::storage::sqlite::SqliteStore;
use actix_web::{web, HttpResponse};
use common::jobs::JobStatus;
use common::model::upload::SubmissionReport;
use common::requests::SubmitUploadRequest;
use log::{info, warn};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

pub(crate) async fn process(
    req: web::Json<SubmitUploadRequest>,
    config: web::Data<Config>,
    jobs: web::Data<JobsState>,
    uploads: web::Data<UploadsState>,
) -> Result<HttpResponse, ApiError> {
    let job_id = schedule_submit_job(
        req.into_inner(),
        config.get_ref().clone(),
        jobs.get_ref().clone(),
        uploads.get_ref().clone(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id })))
}

async fn schedule_submit_job(
    req: SubmitUploadRequest,
    config: Config,
    jobs: JobsState,
    uploads: UploadsState,
) -> Result<String, ApiError> {
    let job_id = Uuid::new_v4().to_string();
    let upload_id = req.upload_id;

    let (job, cancel) = {
        let mut sessions = uploads.sessions.write().await;
        find_session(&mut sessions, &upload_id, None)?.begin_submit(&job_id)?
    };
    jobs.jobs
        .write()
        .await
        .insert(job_id.clone(), JobStatus::Pending);
    info!(
        "job {} submitting {} products of upload {}",
        job_id,
        job.products.len(),
        upload_id
    );

    let value = job_id.clone();
    tokio::spawn(async move {
        let tx_block = jobs.tx.clone();
        let uploads_block = uploads.clone();
        let job_id_block = value.clone();
        let upload_id_block = upload_id.clone();

        let handle = tokio::task::spawn_blocking(move || {
            submit_blocking(
                tx_block,
                uploads_block,
                &job_id_block,
                &upload_id_block,
                &config,
                &job,
                &cancel,
            )
        });

        let outcome: Result<SubmissionReport, String> = match handle.await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(e)) => Err(e),
            Err(join_err) => Err(format!("join error: {}", join_err)),
        };

        let status = match &outcome {
            Ok(report) => JobStatus::Completed(report.clone()),
            Err(e) => {
                warn!("job {} failed: {}", value, e);
                JobStatus::Failed(e.clone())
            }
        };
        jobs.jobs.write().await.insert(value.clone(), status);

        let mut sessions = uploads.sessions.write().await;
        match sessions
            .get_mut(&upload_id)
            .and_then(|s| s.finish_job(&value, outcome))
        {
            Some(final_status) => info!("upload {} finished: {}", upload_id, final_status),
            None => info!("job {} ended after upload {} was cancelled", value, upload_id),
        }
    });

    Ok(job_id)
}

/// Runs on the blocking pool: opens the store, pushes every batch and records
/// the upload log. Only an unreachable store fails the job.
fn submit_blocking(
    tx: mpsc::Sender<JobUpdate>,
    uploads: UploadsState,
    job_id: &str,
    upload_id: &str,
    config: &Config,
    job: &SubmissionJob,
    cancel: &Arc<AtomicBool>,
) -> Result<SubmissionReport, String> {
    let mut store = SqliteStore::open(&config.database_path).map_err(|e| e.to_string())?;

    Ok(run_submission(&mut store, job, config.batch_size, cancel, |progress| {
        let _ = tx.blocking_send(JobUpdate {
            job_id: job_id.to_string(),
            status: JobStatus::InProgress(progress),
        });
        let mut sessions = uploads.sessions.blocking_write();
        if let Some(session) = sessions.get_mut(upload_id) {
            if session.owns_job(job_id) {
                let _ = session.state.record_progress(progress);
            }
        }
    }))
}
