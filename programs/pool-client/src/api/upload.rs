use tracing::info;

use super::{checked, ApiClient};
use crate::constants::MAX_UPLOAD_BYTES;
use crate::error::ClientError;
use crate::records::UploadResponse;
use crate::transport::{HttpRequest, Transport};

impl<T: Transport> ApiClient<T> {
    /// `POST /api/upload` with a raw image body; returns the hosted URL.
    pub async fn upload_image(&self, content_type: &str, data: Vec<u8>) -> Result<String, ClientError> {
        if !content_type.starts_with("image/") {
            return Err(ClientError::validation(
                "Invalid File",
                format!("{content_type} is not an image"),
            ));
        }
        if data.is_empty() || data.len() > MAX_UPLOAD_BYTES {
            return Err(ClientError::validation(
                "Invalid File",
                format!("Images must be between 1 byte and {} MB", MAX_UPLOAD_BYTES / (1024 * 1024)),
            ));
        }

        let size = data.len();
        let response = self
            .fetch(HttpRequest::post_bytes("/api/upload", content_type, data), "upload")
            .await?;
        let uploaded: UploadResponse = checked(response, "upload")?;
        info!(size, url = %uploaded.url, "image uploaded");
        Ok(uploaded.url)
    }
}
