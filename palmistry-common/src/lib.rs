pub mod clock;
pub mod image_id;
pub mod sha256;
