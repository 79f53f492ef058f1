//! One seller's upload: the file it came from and its submission gate.

use crate::catalog::category::CategoryTable;
use crate::catalog::gate::{GateError, UploadState};
use crate::catalog::ingest::{FileFormat, ParsedFile};
use crate::catalog::submit::SubmissionJob;
use crate::catalog::validate::validate_rows;
use crate::job_controller::state::UploadsState;
use crate::services::bulk_upload::error::ApiError;
use actix_web::web;
use common::model::upload::{SubmissionReport, UploadStatus};
use log::info;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize)]
pub struct UploadSession {
    pub upload_id: String,
    pub seller_id: String,
    pub file_name: Option<String>,
    pub file_md5: Option<String>,
    pub format: Option<FileFormat>,
    pub ignored_columns: Vec<String>,
    /// The job currently (or last) submitting this upload.
    pub job_id: Option<String>,
    #[serde(flatten)]
    pub state: UploadState,
    #[serde(skip)]
    cancel: Arc<AtomicBool>,
    /// Last time an endpoint looked the session up.
    #[serde(skip)]
    touched: Instant,
}

/// What the endpoints return for a session.
#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: UploadSession,
    pub can_submit: bool,
    pub error_count: usize,
}

impl UploadSession {
    pub fn new(upload_id: String, seller_id: String) -> Self {
        Self {
            upload_id,
            seller_id,
            file_name: None,
            file_md5: None,
            format: None,
            ignored_columns: Vec::new(),
            job_id: None,
            state: UploadState::Idle,
            cancel: Arc::new(AtomicBool::new(false)),
            touched: Instant::now(),
        }
    }

    /// A running submission keeps its session alive whatever its age.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        !self.state.is_submitting() && self.touched.elapsed() >= ttl
    }

    /// Replaces the rows with a freshly parsed file.
    pub fn load_file(&mut self, parsed: ParsedFile, file_md5: String) -> Result<(), GateError> {
        self.state.load(parsed.rows)?;
        self.file_name = Some(parsed.file_name);
        self.file_md5 = Some(file_md5);
        self.format = Some(parsed.format);
        self.ignored_columns = parsed.ignored_columns;
        Ok(())
    }

    /// Moves the gate into `Submitting` and prepares the job for the worker.
    /// Each submission gets its own cancel flag.
    pub fn begin_submit(&mut self, job_id: &str) -> Result<(SubmissionJob, Arc<AtomicBool>), GateError> {
        let products = self.state.begin_submit()?;
        self.job_id = Some(job_id.to_string());
        self.cancel = Arc::new(AtomicBool::new(false));
        let job = SubmissionJob {
            seller_id: self.seller_id.clone(),
            file_name: self.file_name.clone().unwrap_or_default(),
            file_md5: self.file_md5.clone().unwrap_or_default(),
            products,
        };
        Ok((job, self.cancel.clone()))
    }

    pub fn owns_job(&self, job_id: &str) -> bool {
        self.state.is_submitting() && self.job_id.as_deref() == Some(job_id)
    }

    /// Applies the worker's result, unless the submission was abandoned.
    pub fn finish_job(
        &mut self,
        job_id: &str,
        outcome: Result<SubmissionReport, String>,
    ) -> Option<UploadStatus> {
        if !self.owns_job(job_id) {
            return None;
        }
        match outcome {
            Ok(report) => self.state.finish(report).ok(),
            Err(reason) => self.state.abort(reason).ok().map(|_| UploadStatus::Failed),
        }
    }

    pub fn cancel(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.state.cancel();
        self.file_name = None;
        self.file_md5 = None;
        self.format = None;
        self.ignored_columns.clear();
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session: self.clone(),
            can_submit: self.state.can_submit(),
            error_count: self.state.errors().len(),
        }
    }
}

/// Looks up a session owned by `seller_id` (any seller when `None`).
pub(crate) fn find_session<'a>(
    sessions: &'a mut HashMap<String, UploadSession>,
    upload_id: &str,
    seller_id: Option<&str>,
) -> Result<&'a mut UploadSession, ApiError> {
    let session = sessions
        .get_mut(upload_id)
        .filter(|s| seller_id.map_or(true, |seller| s.seller_id == seller))
        .ok_or_else(|| ApiError::UploadNotFound(upload_id.to_string()))?;
    session.touched = Instant::now();
    Ok(session)
}

/// Runs `Parsed -> Validating -> Blocked | Ready` for a session. The lock is
/// released while rows are checked; if the session changed meanwhile the
/// result is rejected as an invalid transition.
pub(crate) async fn revalidate(
    uploads: &UploadsState,
    categories: &CategoryTable,
    upload_id: &str,
) -> Result<SessionView, ApiError> {
    let rows = {
        let mut sessions = uploads.sessions.write().await;
        find_session(&mut sessions, upload_id, None)?
            .state
            .begin_validation()?
    };

    let table = categories.clone();
    let report = web::block(move || validate_rows(rows, &table))
        .await
        .map_err(ApiError::internal)?;

    let mut sessions = uploads.sessions.write().await;
    let session = find_session(&mut sessions, upload_id, None)?;
    let error_count = report.errors.len();
    session.state.complete_validation(report)?;
    info!(
        "upload {} validated: {} ({} errors)",
        upload_id,
        session.state.name(),
        error_count
    );
    Ok(session.view())
}
