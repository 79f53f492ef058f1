use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Progress of a running submission, reported after each batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    /// 1-based index of the last batch that was sent.
    pub current_batch: usize,
    pub total_batches: usize,
    pub rows_submitted: usize,
    pub total_rows: usize,
}

/// A row the product store refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    pub row_number: usize,
    pub message: String,
}

/// Result of sending one batch to the product store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// 1-based batch index.
    pub batch: usize,
    pub attempted: usize,
    pub succeeded: usize,
    /// Rows rejected individually by the store.
    pub failures: Vec<RowFailure>,
    /// Set when the whole batch was rejected (every attempted row failed).
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn failed_rows(&self) -> usize {
        self.attempted - self.succeeded
    }
}

/// Final (or, after a cancel, partial) summary of a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub total_rows: usize,
    pub success_rows: usize,
    pub failed_rows: usize,
    pub batches: Vec<BatchOutcome>,
    /// True when the submission stopped early because the seller cancelled.
    pub cancelled: bool,
}

impl SubmissionReport {
    pub fn push(&mut self, outcome: BatchOutcome) {
        self.success_rows += outcome.succeeded;
        self.failed_rows += outcome.failed_rows();
        self.batches.push(outcome);
    }

    /// Worst outcome observed: `Completed` only when no row failed.
    pub fn status(&self) -> UploadStatus {
        if self.failed_rows == 0 && !self.cancelled {
            UploadStatus::Completed
        } else if self.success_rows == 0 {
            UploadStatus::Failed
        } else {
            UploadStatus::CompletedWithErrors
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Completed,
    CompletedWithErrors,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Completed => "completed",
            UploadStatus::CompletedWithErrors => "completed_with_errors",
            UploadStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(UploadStatus::Completed),
            "completed_with_errors" => Ok(UploadStatus::CompletedWithErrors),
            "failed" => Ok(UploadStatus::Failed),
            other => Err(format!("unknown upload status '{}'", other)),
        }
    }
}

/// Persisted summary of one bulk upload attempt, shown in the seller's upload
/// history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLog {
    pub id: String, // UUID
    pub seller_id: String,
    pub file_name: String,
    pub file_md5: String,
    pub total_rows: usize,
    pub success_rows: usize,
    pub failed_rows: usize,
    pub status: UploadStatus,
    /// RFC 3339, UTC.
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(batch: usize, attempted: usize, succeeded: usize) -> BatchOutcome {
        BatchOutcome {
            batch,
            attempted,
            succeeded,
            failures: Vec::new(),
            error: None,
        }
    }

    #[test]
    fn status_reflects_worst_batch() {
        let mut report = SubmissionReport {
            total_rows: 6,
            ..Default::default()
        };
        report.push(outcome(1, 3, 3));
        assert_eq!(report.status(), UploadStatus::Completed);

        report.push(outcome(2, 3, 1));
        assert_eq!(report.success_rows, 4);
        assert_eq!(report.failed_rows, 2);
        assert_eq!(report.status(), UploadStatus::CompletedWithErrors);
    }

    #[test]
    fn nothing_accepted_is_failed() {
        let mut report = SubmissionReport::default();
        report.push(outcome(1, 2, 0));
        assert_eq!(report.status(), UploadStatus::Failed);
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            UploadStatus::Completed,
            UploadStatus::CompletedWithErrors,
            UploadStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<UploadStatus>(), Ok(status));
        }
        assert!("done".parse::<UploadStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&UploadStatus::CompletedWithErrors).unwrap(),
            "\"completed_with_errors\""
        );
    }
}
