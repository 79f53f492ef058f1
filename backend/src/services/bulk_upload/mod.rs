//! HTTP API for seller bulk product uploads.
//!
//! A seller uploads a CSV or Excel file, fixes the rows the validator rejects
//! and submits the clean result. Every upload is an `UploadSession` held in
//! `UploadsState`; its submission gate decides which calls are allowed. The
//! submission itself runs as a background job tracked by `JobsState`.
//!
//! The provided routes are:
//! - `GET /api/bulk_upload/template.csv`, `/template.xlsx`, `/instructions.txt`
//!   and `/categories.csv`: downloadable templates, the field guide and the
//!   category reference list.
//!
//! - `POST /api/bulk_upload/upload`: multipart upload with `seller_id`, an
//!   optional `upload_id` (to replace the file of an existing upload) and
//!   `file`. The file is parsed and validated; the answer carries the rows,
//!   every row error and whether the upload can be submitted.
//!
//! - `GET /api/bulk_upload/{upload_id}`: the current session view.
//!
//! - `PUT /api/bulk_upload/{upload_id}/rows/{row_number}`: replaces one row
//!   and validates the whole upload again.
//!
//! - `DELETE /api/bulk_upload/{upload_id}`: cancels and forgets the upload.
//!   A running submission stops before its next batch.
//!
//! - `POST /api/bulk_upload/submit`: starts submitting a `ready` upload and
//!   returns a `job_id`. Rejected with `409` in any other state.
//!
//! - `GET /api/bulk_upload/status/{job_id}`: polls a submission job
//!   (`Pending`, `InProgress`, `Completed` or `Failed`).
//!
//! - `GET /api/bulk_upload/logs/{seller_id}`: past submissions of a seller.

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

mod cancel;
mod edit_row;
pub mod error;
mod get_session;
mod get_status;
mod logs;
pub mod session;
mod submit;
mod templates;
mod upload;

const API_PATH: &str = "/api/bulk_upload";

/// Configures and returns the Actix scope for bulk upload routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        // Fixed paths first so `/{upload_id}` does not swallow them.
        .route("/template.csv", get().to(templates::csv_template))
        .route("/template.xlsx", get().to(templates::xlsx_template))
        .route("/instructions.txt", get().to(templates::instructions))
        .route("/categories.csv", get().to(templates::categories))
        .route("/upload", post().to(upload::process))
        .route("/submit", post().to(submit::process))
        .route("/status/{job_id}", get().to(get_status::process))
        .route("/logs/{seller_id}", get().to(logs::process))
        .route("/{upload_id}", get().to(get_session::process))
        .route("/{upload_id}", delete().to(cancel::process))
        .route("/{upload_id}/rows/{row_number}", put().to(edit_row::process))
}
