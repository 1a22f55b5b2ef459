use std::time::{Duration, SystemTime};

pub mod memory;
pub mod sqlite;
pub mod store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub ttl: Duration,
    pub max_items: usize,
    pub max_total_bytes: u64,
    pub max_image_bytes: u64,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            max_items: 256,
            max_total_bytes: 256 * 1024 * 1024,
            max_image_bytes: 10 * 1024 * 1024,
        }
    }
}

impl StoreLimits {
    /// Largest single image the store can ever hold.
    pub fn image_size_limit(&self) -> u64 {
        self.max_image_bytes.min(self.max_total_bytes)
    }

    fn check_image_size(&self, size: u64) -> Result<(), ImageStoreError> {
        if size == 0 {
            return Err(ImageStoreError::EmptyImage);
        }
        let limit = self.image_size_limit();
        if size > limit || self.max_items == 0 {
            return Err(ImageStoreError::ImageTooLarge { size, limit });
        }
        Ok(())
    }

    fn must_evict(&self, stored: usize, total_bytes: u64, incoming: u64) -> bool {
        stored >= self.max_items || total_bytes + incoming > self.max_total_bytes
    }
}

#[derive(Debug)]
pub struct PutImageRequest {
    pub data: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug)]
pub struct PutImageResponse {
    pub image_id: String,
    pub expires_at: SystemTime,
}

#[derive(Debug)]
pub struct GetImageRequest {
    pub image_id: String,
}

#[derive(Debug, Clone)]
pub enum GetImageResponse {
    Found {
        data: Vec<u8>,
        content_type: String,
        expires_at: SystemTime,
    },
    NotFound,
}

#[derive(Debug)]
pub struct DeleteImageRequest {
    pub image_id: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DeleteImageResponse {
    Deleted,
    NotFound,
}

#[derive(Debug)]
pub struct PurgeExpiredRequest {}

#[derive(Debug, PartialEq, Eq)]
pub struct PurgeExpiredResponse {
    pub purged: u64,
}

#[derive(Debug)]
pub struct GetStatsRequest {}

#[derive(Debug, PartialEq, Eq)]
pub struct GetStatsResponse {
    pub stored: u64,
    pub total_bytes: u64,
}

#[derive(Debug)]
pub enum ImageStoreError {
    EmptyImage,
    ImageTooLarge { size: u64, limit: u64 },
    IOError(std::io::Error),
    Sqlite(rusqlite::Error),
    InvalidTimestamp(String),
}

impl std::fmt::Display for ImageStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageStoreError::EmptyImage => write!(f, "image is empty"),
            ImageStoreError::ImageTooLarge { size, limit } => {
                write!(f, "image is {size} bytes, limit is {limit} bytes")
            }
            ImageStoreError::IOError(e) => write!(f, "io error: {e}"),
            ImageStoreError::Sqlite(e) => write!(f, "sqlite error: {e}"),
            ImageStoreError::InvalidTimestamp(s) => write!(f, "invalid timestamp: {s}"),
        }
    }
}

impl std::error::Error for ImageStoreError {}

/// Temporary image storage behind the upload proxy.
///
/// Every backend enforces the same contract: records expire `ttl` after
/// upload, expired records read as `NotFound`, and inserting evicts the
/// least recently used records until `max_items` and `max_total_bytes` hold.
pub trait ImageStoreTrait {
    fn put_image(&self, request: PutImageRequest) -> Result<PutImageResponse, ImageStoreError>;

    fn get_image(&self, request: GetImageRequest) -> Result<GetImageResponse, ImageStoreError>;

    fn delete_image(
        &self,
        request: DeleteImageRequest,
    ) -> Result<DeleteImageResponse, ImageStoreError>;

    fn purge_expired(
        &self,
        request: PurgeExpiredRequest,
    ) -> Result<PurgeExpiredResponse, ImageStoreError>;

    fn get_stats(&self, request: GetStatsRequest) -> Result<GetStatsResponse, ImageStoreError>;

    fn limits(&self) -> StoreLimits;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_image_size() {
        let limits = StoreLimits {
            max_image_bytes: 10,
            max_total_bytes: 8,
            ..StoreLimits::default()
        };
        assert!(matches!(
            limits.check_image_size(0),
            Err(ImageStoreError::EmptyImage)
        ));
        assert!(limits.check_image_size(8).is_ok());
        assert!(matches!(
            limits.check_image_size(9),
            Err(ImageStoreError::ImageTooLarge { size: 9, limit: 8 })
        ));
    }

    #[test]
    fn test_must_evict() {
        let limits = StoreLimits {
            max_items: 2,
            max_total_bytes: 100,
            ..StoreLimits::default()
        };
        assert!(!limits.must_evict(1, 50, 50));
        assert!(limits.must_evict(2, 0, 1));
        assert!(limits.must_evict(1, 60, 41));
    }
}
