use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{ApiClient, Host};
use crate::chat::attachments::PickedFile;
use crate::error::Result;

/// What the upload endpoint hands back: the retrievable URL of the stored
/// blob and the canonical file name assigned by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub name: String,
}

impl ApiClient {
    /// Uploads a picked file to the chat server's upload endpoint.
    ///
    /// This is phase one of the two-phase attachment send: nothing is echoed
    /// locally and no message exists until this call succeeds. The bytes go
    /// up as the `file` field of a multipart form.
    pub async fn upload_file(&self, token: &str, file: &PickedFile) -> Result<UploadResponse> {
        tracing::debug!(
            target: "stride::api::upload",
            "Uploading file: {} ({} bytes)",
            file.name,
            file.data.len()
        );

        let mime = file
            .mime_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let part = Part::bytes(file.data.clone())
            .file_name(file.name.clone())
            .mime_str(&mime)
            .map_err(|e| crate::error::StrideError::Configuration(e.to_string()))?;
        let form = Form::new().part("file", part);

        let request = self
            .request(Method::POST, Host::Chat, "/upload", Some(token))
            .multipart(form);
        self.execute(request, "File upload failed").await
    }
}
