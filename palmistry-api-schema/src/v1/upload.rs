use serde::{Deserialize, Serialize};

/// Name of the multipart field carrying the image.
pub const V1_UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V1UploadResponse {
    pub image_url: String,
}
