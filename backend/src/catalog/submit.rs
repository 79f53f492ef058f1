//! Sequential batched submission of validated products.
//!
//! Batches go out one after another so progress stays monotonic and every
//! failure can be pinned to a batch. A failed batch never stops the ones
//! after it. Cancellation is cooperative: the flag is checked before each
//! batch and nothing already accepted is rolled back.

use crate::storage::{ProductStore, UploadLogStore};
use chrono::Utc;
use common::model::product::ValidatedProduct;
use common::model::upload::{BatchOutcome, BatchProgress, SubmissionReport, UploadLog};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Everything a background worker needs to push one upload to the store.
#[derive(Debug, Clone)]
pub struct SubmissionJob {
    pub seller_id: String,
    pub file_name: String,
    pub file_md5: String,
    pub products: Vec<ValidatedProduct>,
}

pub fn submit_batches<S>(
    store: &mut S,
    seller_id: &str,
    products: &[ValidatedProduct],
    batch_size: usize,
    cancel: &AtomicBool,
    mut on_progress: impl FnMut(BatchProgress),
) -> SubmissionReport
where
    S: ProductStore + ?Sized,
{
    let batch_size = batch_size.max(1);
    let total_rows = products.len();
    let total_batches = total_rows.div_ceil(batch_size);
    let mut report = SubmissionReport {
        total_rows,
        ..Default::default()
    };
    let mut rows_submitted = 0;

    for (index, batch) in products.chunks(batch_size).enumerate() {
        if cancel.load(Ordering::SeqCst) {
            info!(
                "submission for seller {} cancelled before batch {}/{}",
                seller_id,
                index + 1,
                total_batches
            );
            report.cancelled = true;
            break;
        }

        let outcome = match store.insert_batch(seller_id, batch) {
            Ok(failures) => {
                if !failures.is_empty() {
                    warn!(
                        "batch {}/{}: {} of {} rows rejected",
                        index + 1,
                        total_batches,
                        failures.len(),
                        batch.len()
                    );
                }
                BatchOutcome {
                    batch: index + 1,
                    attempted: batch.len(),
                    succeeded: batch.len().saturating_sub(failures.len()),
                    failures,
                    error: None,
                }
            }
            Err(e) => {
                warn!("batch {}/{} failed: {}", index + 1, total_batches, e);
                BatchOutcome {
                    batch: index + 1,
                    attempted: batch.len(),
                    succeeded: 0,
                    failures: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };
        report.push(outcome);

        rows_submitted += batch.len();
        on_progress(BatchProgress {
            current_batch: index + 1,
            total_batches,
            rows_submitted,
            total_rows,
        });
    }

    report
}

pub fn upload_log(job: &SubmissionJob, report: &SubmissionReport) -> UploadLog {
    UploadLog {
        id: Uuid::new_v4().to_string(),
        seller_id: job.seller_id.clone(),
        file_name: job.file_name.clone(),
        file_md5: job.file_md5.clone(),
        total_rows: report.total_rows,
        success_rows: report.success_rows,
        failed_rows: report.failed_rows,
        status: report.status(),
        created_at: Utc::now().to_rfc3339(),
    }
}

/// Submits every batch, then records the upload log. The report reflects the
/// batches alone; a failed log write is only logged since the rows are saved.
pub fn run_submission<S>(
    store: &mut S,
    job: &SubmissionJob,
    batch_size: usize,
    cancel: &AtomicBool,
    on_progress: impl FnMut(BatchProgress),
) -> SubmissionReport
where
    S: ProductStore + UploadLogStore,
{
    let report = submit_batches(
        store,
        &job.seller_id,
        &job.products,
        batch_size,
        cancel,
        on_progress,
    );
    if let Err(e) = store.record_upload(&upload_log(job, &report)) {
        warn!(
            "upload log for '{}' (seller {}) not recorded: {}",
            job.file_name, job.seller_id, e
        );
    }
    info!(
        "upload '{}' for seller {}: {} saved, {} failed ({})",
        job.file_name,
        job.seller_id,
        report.success_rows,
        report.failed_rows,
        report.status()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::SqliteStore;
    use crate::storage::StoreError;
    use common::model::category::CategoryRef;
    use common::model::upload::{RowFailure, UploadStatus};

    fn products(count: usize) -> Vec<ValidatedProduct> {
        (0..count)
            .map(|i| ValidatedProduct {
                row_number: i + 2,
                title: format!("Item {}", i),
                sku: Some(format!("SKU-{}", i)),
                category: CategoryRef {
                    code: "8".to_string(),
                    name: "Groceries".to_string(),
                },
                brand: None,
                price: 99.0,
                discount_price: None,
                stock_quantity: 10,
                description: None,
                image_urls: Vec::new(),
                size: None,
                color: None,
            })
            .collect()
    }

    /// Fails batch 2 outright and rejects the first row of batch 3.
    #[derive(Default)]
    struct FlakyStore {
        calls: usize,
        saved: usize,
    }

    impl ProductStore for FlakyStore {
        fn insert_batch(
            &mut self,
            _seller_id: &str,
            batch: &[ValidatedProduct],
        ) -> Result<Vec<RowFailure>, StoreError> {
            self.calls += 1;
            match self.calls {
                2 => Err(StoreError::Database(rusqlite::Error::InvalidQuery)),
                3 => {
                    self.saved += batch.len() - 1;
                    Ok(vec![RowFailure {
                        row_number: batch[0].row_number,
                        message: "rejected".to_string(),
                    }])
                }
                _ => {
                    self.saved += batch.len();
                    Ok(Vec::new())
                }
            }
        }
    }

    #[test]
    fn failed_batches_do_not_stop_later_ones() {
        let mut store = FlakyStore::default();
        let items = products(10);
        let mut seen = Vec::new();
        let report = submit_batches(&mut store, "s1", &items, 3, &AtomicBool::new(false), |p| {
            seen.push(p)
        });

        assert_eq!(store.calls, 4);
        assert_eq!(report.batches.len(), 4);
        assert_eq!(report.success_rows, 6);
        assert_eq!(report.failed_rows, 4);
        assert_eq!(store.saved, 6);
        assert!(report.batches[1].error.is_some());
        assert_eq!(report.batches[2].failures[0].row_number, 8);
        assert_eq!(report.status(), UploadStatus::CompletedWithErrors);

        let batches: Vec<usize> = seen.iter().map(|p| p.current_batch).collect();
        assert_eq!(batches, vec![1, 2, 3, 4]);
        assert!(seen.iter().all(|p| p.total_batches == 4));
        assert_eq!(seen.last().unwrap().rows_submitted, 10);
    }

    #[test]
    fn cancel_stops_before_the_next_batch() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let items = products(5);
        let cancel = AtomicBool::new(false);
        let report = submit_batches(&mut store, "s1", &items, 2, &cancel, |_| {
            cancel.store(true, Ordering::SeqCst)
        });

        assert!(report.cancelled);
        assert_eq!(report.batches.len(), 1);
        assert_eq!(report.success_rows, 2);
        // accepted rows stay in the store
        assert_eq!(store.count_products("s1").unwrap(), 2);
    }

    #[test]
    fn run_submission_records_the_upload_log() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let job = SubmissionJob {
            seller_id: "s1".to_string(),
            file_name: "groceries.xlsx".to_string(),
            file_md5: "abc".to_string(),
            products: products(7),
        };
        let report = run_submission(&mut store, &job, 50, &AtomicBool::new(false), |_| {});
        assert_eq!(report.status(), UploadStatus::Completed);

        let logs = store.list_uploads("s1", 5).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].file_name, "groceries.xlsx");
        assert_eq!(logs[0].total_rows, 7);
        assert_eq!(logs[0].success_rows, 7);
        assert_eq!(logs[0].status, UploadStatus::Completed);
    }

    /// Accepts every row but cannot write upload logs.
    #[derive(Default)]
    struct NoLogStore {
        saved: usize,
    }

    impl ProductStore for NoLogStore {
        fn insert_batch(
            &mut self,
            _seller_id: &str,
            batch: &[ValidatedProduct],
        ) -> Result<Vec<RowFailure>, StoreError> {
            self.saved += batch.len();
            Ok(Vec::new())
        }
    }

    impl UploadLogStore for NoLogStore {
        fn record_upload(&mut self, _log: &UploadLog) -> Result<(), StoreError> {
            Err(StoreError::Database(rusqlite::Error::InvalidQuery))
        }

        fn list_uploads(&self, _seller_id: &str, _limit: usize) -> Result<Vec<UploadLog>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn failed_log_write_keeps_the_report() {
        let mut store = NoLogStore::default();
        let job = SubmissionJob {
            seller_id: "s1".to_string(),
            file_name: "toys.csv".to_string(),
            file_md5: "abc".to_string(),
            products: products(2),
        };
        let report = run_submission(&mut store, &job, 1, &AtomicBool::new(false), |_| {});
        assert_eq!(store.saved, 2);
        assert_eq!(report.success_rows, 2);
        assert_eq!(report.batches.len(), 2);
        assert_eq!(report.status(), UploadStatus::Completed);
    }

    /// Reports more failures than rows it was given.
    struct OverReportingStore;

    impl ProductStore for OverReportingStore {
        fn insert_batch(
            &mut self,
            _seller_id: &str,
            batch: &[ValidatedProduct],
        ) -> Result<Vec<RowFailure>, StoreError> {
            let failure = RowFailure {
                row_number: batch[0].row_number,
                message: "rejected".to_string(),
            };
            Ok(vec![failure.clone(), failure])
        }
    }

    #[test]
    fn more_failures_than_rows_counts_no_successes() {
        let items = products(1);
        let report = submit_batches(
            &mut OverReportingStore,
            "s1",
            &items,
            50,
            &AtomicBool::new(false),
            |_| {},
        );
        assert_eq!(report.batches[0].succeeded, 0);
        assert_eq!(report.success_rows, 0);
    }
}
