pub mod error;
pub mod upload;
pub mod upload_stats;
