//! Persistence seams for the submission pipeline.
//!
//! The pipeline only talks to these traits; [`sqlite::SqliteStore`] is the
//! local implementation used by the server, tests plug in fakes.

pub mod sqlite;

use common::model::product::ValidatedProduct;
use common::model::upload::{RowFailure, UploadLog};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("unreadable upload log '{id}': {reason}")]
    Corrupt { id: String, reason: String },
}

pub trait ProductStore {
    /// Saves one batch. Rows the store refuses individually come back as
    /// [`RowFailure`]s; an `Err` means nothing in the batch was saved.
    fn insert_batch(
        &mut self,
        seller_id: &str,
        batch: &[ValidatedProduct],
    ) -> Result<Vec<RowFailure>, StoreError>;
}

pub trait UploadLogStore {
    fn record_upload(&mut self, log: &UploadLog) -> Result<(), StoreError>;

    /// Most recent first.
    fn list_uploads(&self, seller_id: &str, limit: usize) -> Result<Vec<UploadLog>, StoreError>;
}
