use serde::Deserialize;

#[derive(Deserialize)]
/// Request payload for the bulk upload submit endpoint.
/// Contains the upload session to submit.
pub struct SubmitUploadRequest {
    pub upload_id: String,
}
