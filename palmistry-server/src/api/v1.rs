pub mod image;
pub mod upload;
pub mod upload_stats;
