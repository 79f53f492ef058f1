use crate::config::Config;
use crate::services::bulk_upload::error::ApiError;
use crate::storage::sqlite::SqliteStore;
use crate::storage::UploadLogStore;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

#[derive(Deserialize)]
pub(crate) struct LogsQuery {
    limit: Option<usize>,
}

/// `GET /api/bulk_upload/logs/{seller_id}?limit=N`: upload history, newest first.
pub(crate) async fn process(
    seller_id: web::Path<String>,
    query: web::Query<LogsQuery>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let database_path = config.database_path.clone();
    let seller_id = seller_id.into_inner();

    let logs = web::block(move || {
        SqliteStore::open(&database_path)?.list_uploads(&seller_id, limit)
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(HttpResponse::Ok().json(logs))
}
