use crate::model::upload::{BatchProgress, SubmissionReport};
use serde::Serialize;

/// State of an asynchronous submission job as seen by polling clients.
#[derive(Clone, Debug, Serialize)]
pub enum JobStatus {
    Pending,
    InProgress(BatchProgress),
    Completed(SubmissionReport),
    Failed(String),
}
