//! The submission gate: an explicit state machine for one upload.
//!
//! ```text
//! Idle -> Parsed -> Validating -> Blocked | Ready -> Submitting
//!      -> Completed | CompletedWithErrors | Failed
//! ```
//!
//! `Ready` is the only state from which `Submitting` is reachable, and
//! `Blocked` only moves on after an edit or a fresh file.

use crate::catalog::validate::ValidationReport;
use common::model::product::{ParsedProductRow, ValidatedProduct};
use common::model::upload::{BatchProgress, SubmissionReport, UploadStatus};
use common::model::validation::ValidationError;
use serde::Serialize;
use std::mem;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("cannot {action} while the upload is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("row {0} is not part of this upload")]
    UnknownRow(usize),
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadState {
    #[default]
    Idle,
    Parsed {
        rows: Vec<ParsedProductRow>,
    },
    Validating {
        rows: Vec<ParsedProductRow>,
    },
    Blocked {
        rows: Vec<ParsedProductRow>,
        errors: Vec<ValidationError>,
    },
    Ready {
        rows: Vec<ParsedProductRow>,
        #[serde(skip)]
        products: Vec<ValidatedProduct>,
    },
    Submitting {
        total_rows: usize,
        progress: BatchProgress,
    },
    Completed {
        report: SubmissionReport,
    },
    CompletedWithErrors {
        report: SubmissionReport,
    },
    Failed {
        reason: String,
        report: Option<SubmissionReport>,
    },
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::Parsed { .. } => "parsed",
            UploadState::Validating { .. } => "validating",
            UploadState::Blocked { .. } => "blocked",
            UploadState::Ready { .. } => "ready",
            UploadState::Submitting { .. } => "submitting",
            UploadState::Completed { .. } => "completed",
            UploadState::CompletedWithErrors { .. } => "completed_with_errors",
            UploadState::Failed { .. } => "failed",
        }
    }

    pub fn can_submit(&self) -> bool {
        matches!(self, UploadState::Ready { .. })
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, UploadState::Submitting { .. })
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            UploadState::Blocked { errors, .. } => errors,
            _ => &[],
        }
    }

    /// A freshly parsed file replaces whatever this upload held before.
    pub fn load(&mut self, rows: Vec<ParsedProductRow>) -> Result<(), GateError> {
        match self {
            UploadState::Validating { .. } | UploadState::Submitting { .. } => {
                Err(invalid("load a new file", self.name()))
            }
            _ => {
                *self = UploadState::Parsed { rows };
                Ok(())
            }
        }
    }

    /// Moves `Parsed -> Validating` and hands out the rows to check.
    pub fn begin_validation(&mut self) -> Result<Vec<ParsedProductRow>, GateError> {
        match mem::take(self) {
            UploadState::Parsed { rows } => {
                *self = UploadState::Validating { rows: rows.clone() };
                Ok(rows)
            }
            other => self.restore(other, "validate"),
        }
    }

    pub fn complete_validation(&mut self, report: ValidationReport) -> Result<(), GateError> {
        match mem::take(self) {
            UploadState::Validating { .. } => {
                *self = if report.is_clean() {
                    UploadState::Ready {
                        rows: report.rows,
                        products: report.products,
                    }
                } else {
                    UploadState::Blocked {
                        rows: report.rows,
                        errors: report.errors,
                    }
                };
                Ok(())
            }
            other => self.restore(other, "finish validation"),
        }
    }

    /// Runs both validation steps in place.
    #[cfg(test)]
    pub fn validate(
        &mut self,
        categories: &crate::catalog::category::CategoryTable,
    ) -> Result<(), GateError> {
        let rows = self.begin_validation()?;
        self.complete_validation(crate::catalog::validate::validate_rows(rows, categories))
    }

    /// Replaces one row with edited data; the upload has to be validated again.
    pub fn edit_row(&mut self, edited: ParsedProductRow) -> Result<(), GateError> {
        let state = self.name();
        let rows = match self {
            UploadState::Parsed { rows }
            | UploadState::Blocked { rows, .. }
            | UploadState::Ready { rows, .. } => rows,
            _ => return Err(invalid("edit rows", state)),
        };
        let slot = rows
            .iter_mut()
            .find(|r| r.row_number == edited.row_number)
            .ok_or(GateError::UnknownRow(edited.row_number))?;
        *slot = edited;

        let rows = mem::take(rows);
        *self = UploadState::Parsed { rows };
        Ok(())
    }

    pub fn begin_submit(&mut self) -> Result<Vec<ValidatedProduct>, GateError> {
        match mem::take(self) {
            UploadState::Ready { products, .. } => {
                let total_rows = products.len();
                *self = UploadState::Submitting {
                    total_rows,
                    progress: BatchProgress {
                        total_rows,
                        ..Default::default()
                    },
                };
                Ok(products)
            }
            other => self.restore(other, "submit"),
        }
    }

    pub fn record_progress(&mut self, update: BatchProgress) -> Result<(), GateError> {
        match self {
            UploadState::Submitting { progress, .. } => {
                *progress = update;
                Ok(())
            }
            _ => Err(invalid("record progress", self.name())),
        }
    }

    pub fn finish(&mut self, report: SubmissionReport) -> Result<UploadStatus, GateError> {
        if !self.is_submitting() {
            return Err(invalid("finish submission", self.name()));
        }
        let status = report.status();
        *self = match status {
            UploadStatus::Completed => UploadState::Completed { report },
            UploadStatus::CompletedWithErrors => UploadState::CompletedWithErrors { report },
            UploadStatus::Failed => UploadState::Failed {
                reason: "no product could be saved".to_string(),
                report: Some(report),
            },
        };
        Ok(status)
    }

    /// The submission broke down before producing a report.
    pub fn abort(&mut self, reason: String) -> Result<(), GateError> {
        if !self.is_submitting() {
            return Err(invalid("abort submission", self.name()));
        }
        *self = UploadState::Failed {
            reason,
            report: None,
        };
        Ok(())
    }

    /// Clears everything. Batches the store already accepted stay accepted.
    pub fn cancel(&mut self) {
        *self = UploadState::Idle;
    }

    fn restore<T>(&mut self, previous: UploadState, action: &'static str) -> Result<T, GateError> {
        let state = previous.name();
        *self = previous;
        Err(invalid(action, state))
    }
}

fn invalid(action: &'static str, state: &'static str) -> GateError {
    GateError::InvalidTransition { action, state }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::category::CategoryTable;
    use common::model::upload::BatchOutcome;

    fn row(row_number: usize, title: &str, stock: &str) -> ParsedProductRow {
        ParsedProductRow {
            row_number,
            title: title.to_string(),
            category: "Books".to_string(),
            price: "350".to_string(),
            stock_quantity: stock.to_string(),
            ..Default::default()
        }
    }

    fn ready_state() -> UploadState {
        let mut state = UploadState::default();
        state.load(vec![row(2, "Novel", "3"), row(3, "Atlas", "1")]).unwrap();
        state.validate(&CategoryTable::standard()).unwrap();
        assert_eq!(state.name(), "ready");
        state
    }

    fn report(attempted: usize, succeeded: usize) -> SubmissionReport {
        let mut report = SubmissionReport {
            total_rows: attempted,
            ..Default::default()
        };
        report.push(BatchOutcome {
            batch: 1,
            attempted,
            succeeded,
            failures: Vec::new(),
            error: None,
        });
        report
    }

    #[test]
    fn errors_block_submission_until_fixed() {
        let table = CategoryTable::standard();
        let mut state = UploadState::default();
        state
            .load(vec![row(2, "Novel", "3"), row(3, "", "1"), row(4, "Atlas", "-5")])
            .unwrap();
        state.validate(&table).unwrap();

        assert_eq!(state.name(), "blocked");
        assert_eq!(state.errors().len(), 2);
        assert!(!state.can_submit());
        assert_eq!(
            state.begin_submit(),
            Err(GateError::InvalidTransition {
                action: "submit",
                state: "blocked"
            })
        );
        assert_eq!(state.name(), "blocked");

        state.edit_row(row(3, "Dictionary", "1")).unwrap();
        assert_eq!(state.name(), "parsed");
        state.validate(&table).unwrap();
        assert_eq!(state.errors().len(), 1);

        state.edit_row(row(4, "Atlas", "5")).unwrap();
        state.validate(&table).unwrap();
        assert!(state.can_submit());
        assert_eq!(state.begin_submit().unwrap().len(), 3);
        assert!(state.is_submitting());
    }

    #[test]
    fn editing_an_unknown_row_is_rejected() {
        let mut state = ready_state();
        assert_eq!(
            state.edit_row(row(99, "Ghost", "1")),
            Err(GateError::UnknownRow(99))
        );
        assert!(state.can_submit());
    }

    #[test]
    fn validation_needs_parsed_rows() {
        let mut state = UploadState::default();
        assert!(state.begin_validation().is_err());
        assert_eq!(state.name(), "idle");
    }

    #[test]
    fn no_new_file_while_submitting() {
        let mut state = ready_state();
        state.begin_submit().unwrap();
        assert!(state.load(vec![row(2, "Other", "1")]).is_err());
        assert!(state.begin_submit().is_err());
    }

    #[test]
    fn finish_maps_report_to_terminal_state() {
        let mut state = ready_state();
        state.begin_submit().unwrap();
        state
            .record_progress(BatchProgress {
                current_batch: 1,
                total_batches: 1,
                rows_submitted: 2,
                total_rows: 2,
            })
            .unwrap();
        assert_eq!(state.finish(report(2, 2)), Ok(UploadStatus::Completed));
        assert_eq!(state.name(), "completed");

        let mut state = ready_state();
        state.begin_submit().unwrap();
        assert_eq!(state.finish(report(2, 1)), Ok(UploadStatus::CompletedWithErrors));

        let mut state = ready_state();
        state.begin_submit().unwrap();
        assert_eq!(state.finish(report(2, 0)), Ok(UploadStatus::Failed));
        assert_eq!(state.name(), "failed");
    }

    #[test]
    fn cancel_always_returns_to_idle() {
        let mut state = ready_state();
        state.begin_submit().unwrap();
        state.cancel();
        assert_eq!(state.name(), "idle");
        // the abandoned job can no longer write its result
        assert!(state.finish(report(2, 2)).is_err());
        assert!(state.abort("late".to_string()).is_err());
    }

    #[test]
    fn serializes_with_a_state_tag() {
        let state = ready_state();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "ready");
        assert_eq!(json["rows"].as_array().unwrap().len(), 2);
        assert!(json.get("products").is_none());
    }
}
