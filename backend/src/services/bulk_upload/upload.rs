use crate::catalog::category::CategoryTable;
use crate::catalog::ingest::parse_file;
use crate::config::Config;
use crate::job_controller::state::{JobsState, UploadsState};
use crate::services::bulk_upload::error::ApiError;
use crate::services::bulk_upload::session::{find_session, revalidate, SessionView, UploadSession};
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use log::info;
use md5::Context;

/// The parts of the upload form.
struct UploadForm {
    seller_id: String,
    upload_id: Option<String>,
    file_name: String,
    bytes: Vec<u8>,
    md5: String,
}

/// `POST /api/bulk_upload/upload`
///
/// Multipart fields: `seller_id`, optional `upload_id` to replace the file of an
/// existing upload, and `file`. File-level problems reject the request; row
/// problems come back inside the session view. Sessions left untouched past
/// the configured TTL are dropped first.
pub(crate) async fn process(
    payload: Multipart,
    config: web::Data<Config>,
    categories: web::Data<CategoryTable>,
    jobs: web::Data<JobsState>,
    uploads: web::Data<UploadsState>,
) -> Result<HttpResponse, ApiError> {
    let form = read_form(payload, config.max_upload_bytes).await?;
    uploads.sweep_stale(&jobs, config.session_ttl()).await;
    let view = ingest_upload(form, &config, &categories, &uploads).await?;
    Ok(HttpResponse::Ok().json(view))
}

async fn ingest_upload(
    form: UploadForm,
    config: &Config,
    categories: &CategoryTable,
    uploads: &UploadsState,
) -> Result<SessionView, ApiError> {
    let max_rows = config.max_rows;
    let file_name = form.file_name.clone();
    let bytes = form.bytes;
    let parsed = web::block(move || parse_file(&file_name, &bytes, max_rows))
        .await
        .map_err(ApiError::internal)??;

    let upload_id = {
        let mut sessions = uploads.sessions.write().await;
        let session = match form.upload_id {
            Some(ref id) => find_session(&mut sessions, id, Some(&form.seller_id))?,
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                sessions
                    .entry(id.clone())
                    .or_insert_with(|| UploadSession::new(id, form.seller_id.clone()))
            }
        };
        session.load_file(parsed, form.md5)?;
        info!(
            "seller {} loaded '{}' into upload {}",
            form.seller_id, form.file_name, session.upload_id
        );
        session.upload_id.clone()
    };

    revalidate(uploads, categories, &upload_id).await
}

async fn read_form(mut payload: Multipart, max_bytes: usize) -> Result<UploadForm, ApiError> {
    let mut seller_id: Option<String> = None;
    let mut upload_id: Option<String> = None;
    let mut file: Option<(String, Vec<u8>, String)> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();

                let mut md5_hasher = Context::new();
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| ApiError::BadRequest(e.to_string()))?;
                    if bytes.len() + chunk.len() > max_bytes {
                        return Err(ApiError::PayloadTooLarge { limit: max_bytes });
                    }
                    md5_hasher.consume(&chunk);
                    bytes.extend_from_slice(&chunk);
                }
                file = Some((filename, bytes, format!("{:x}", md5_hasher.finalize())));
            }
            Some("seller_id") => seller_id = Some(read_text(&mut field).await?),
            Some("upload_id") => {
                upload_id = Some(read_text(&mut field).await?).filter(|id| !id.is_empty())
            }
            _ => {}
        }
    }

    let seller_id = seller_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("seller_id is required".to_string()))?;
    let (file_name, bytes, md5) =
        file.ok_or_else(|| ApiError::BadRequest("file is required".to_string()))?;

    Ok(UploadForm {
        seller_id,
        upload_id,
        file_name,
        bytes,
        md5,
    })
}

async fn read_text(field: &mut Field) -> Result<String, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        bytes.extend_from_slice(&chunk.map_err(|e| ApiError::BadRequest(e.to_string()))?);
    }
    String::from_utf8(bytes)
        .map(|s| s.trim().to_string())
        .map_err(|_| ApiError::BadRequest("form fields must be UTF-8".to_string()))
}
