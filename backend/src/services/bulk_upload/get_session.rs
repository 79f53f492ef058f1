use crate::job_controller::state::UploadsState;
use crate::services::bulk_upload::error::ApiError;
use crate::services::bulk_upload::session::find_session;
use actix_web::{web, HttpResponse};

pub(crate) async fn process(
    upload_id: web::Path<String>,
    uploads: web::Data<UploadsState>,
) -> Result<HttpResponse, ApiError> {
    let mut sessions = uploads.sessions.write().await;
    let session = find_session(&mut sessions, &upload_id, None)?;
    Ok(HttpResponse::Ok().json(session.view()))
}
