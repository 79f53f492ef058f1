use crate::job_controller::state::UploadsState;
use crate::services::bulk_upload::error::ApiError;
use crate::services::bulk_upload::session::find_session;
use actix_web::{web, HttpResponse};
use log::info;

/// `DELETE /api/bulk_upload/{upload_id}`
///
/// Stops a running submission before its next batch and forgets the upload.
/// Batches already saved are kept. The answer is the session's final, idle
/// view; later calls with this id get a 404.
pub(crate) async fn process(
    upload_id: web::Path<String>,
    uploads: web::Data<UploadsState>,
) -> Result<HttpResponse, ApiError> {
    let mut sessions = uploads.sessions.write().await;
    let session = find_session(&mut sessions, &upload_id, None)?;
    let was = session.state.name();
    session.cancel();
    let view = session.view();
    sessions.remove(upload_id.as_str());
    info!("upload {} cancelled while {}", upload_id, was);
    Ok(HttpResponse::Ok().json(view))
}
