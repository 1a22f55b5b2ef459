use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V1UploadStatsResponse {
    pub stored: u64,
    pub total_bytes: u64,
}
