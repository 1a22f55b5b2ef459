//! Client-side image preparation before submission.
//!
//! Phone photos are large and often stored sideways with an EXIF
//! orientation tag. The backend expects an upright image, so the picture is
//! rotated, downscaled and re-encoded as JPEG before it is sent.

use std::io::Cursor;

use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, metadata::Orientation, DynamicImage,
    GenericImageView, ImageDecoder, ImageFormat, ImageReader,
};
use log::{debug, warn};

use crate::state::SelectedImage;

pub const DEFAULT_MAX_DIMENSION: u32 = 1600;
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareOptions {
    /// Longest side after downscaling, in pixels.
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Debug)]
pub enum PrepareError {
    IO(std::io::Error),
    Decode(image::ImageError),
    Encode(image::ImageError),
}

impl std::fmt::Display for PrepareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrepareError::IO(e) => write!(f, "failed to read image: {e}"),
            PrepareError::Decode(e) => write!(f, "failed to decode image: {e}"),
            PrepareError::Encode(e) => write!(f, "failed to encode image: {e}"),
        }
    }
}

impl std::error::Error for PrepareError {}

pub fn prepare_image(
    image: &SelectedImage,
    options: &PrepareOptions,
) -> Result<SelectedImage, PrepareError> {
    let reader = ImageReader::new(Cursor::new(image.data.as_slice()))
        .with_guessed_format()
        .map_err(PrepareError::IO)?;
    let source_format = reader.format();
    let mut decoder = reader.into_decoder().map_err(PrepareError::Decode)?;
    let orientation = decoder
        .orientation()
        .unwrap_or(Orientation::NoTransforms);
    let mut decoded = DynamicImage::from_decoder(decoder).map_err(PrepareError::Decode)?;

    let (width, height) = decoded.dimensions();
    let needs_resize = width.max(height) > options.max_dimension;
    if source_format == Some(ImageFormat::Jpeg)
        && !needs_resize
        && orientation == Orientation::NoTransforms
    {
        debug!("{} is already prepared ({}x{})", image.file_name, width, height);
        return Ok(image.clone());
    }

    decoded.apply_orientation(orientation);
    if needs_resize {
        decoded = decoded.resize(
            options.max_dimension,
            options.max_dimension,
            FilterType::Triangle,
        );
    }

    let rgb = decoded.to_rgb8();
    let mut data = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut data, options.jpeg_quality);
        encoder.encode_image(&rgb).map_err(PrepareError::Encode)?;
    }
    debug!(
        "prepared {}: {}x{} -> {}x{}, {} -> {} bytes",
        image.file_name,
        width,
        height,
        rgb.width(),
        rgb.height(),
        image.data.len(),
        data.len()
    );

    Ok(SelectedImage {
        file_name: image.file_name.clone(),
        content_type: ImageFormat::Jpeg.to_mime_type().to_string(),
        data,
    })
}

/// Like [`prepare_image`], but sends the original bytes when the image
/// cannot be decoded (HEIC, truncated files, ...).
pub fn prepare_or_original(image: &SelectedImage, options: &PrepareOptions) -> SelectedImage {
    match prepare_image(image, options) {
        Ok(prepared) => prepared,
        Err(e) => {
            warn!("sending {} unprepared: {}", image.file_name, e);
            image.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn selected(data: Vec<u8>) -> SelectedImage {
        SelectedImage::new("palm".to_string(), data)
    }

    #[test]
    fn test_large_image_is_downscaled_to_jpeg() {
        let image = selected(encode(3200, 800, ImageFormat::Png));
        assert_eq!(image.content_type, "image/png");

        let prepared = prepare_image(&image, &PrepareOptions::default()).unwrap();
        assert_eq!(prepared.content_type, "image/jpeg");
        assert_eq!(image::guess_format(&prepared.data).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&prepared.data).unwrap();
        assert_eq!(decoded.dimensions(), (1600, 400));
    }

    #[test]
    fn test_small_png_is_reencoded_without_resizing() {
        let image = selected(encode(64, 48, ImageFormat::Png));
        let prepared = prepare_image(&image, &PrepareOptions::default()).unwrap();
        assert_eq!(prepared.content_type, "image/jpeg");
        let decoded = image::load_from_memory(&prepared.data).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn test_small_jpeg_is_left_alone() {
        let image = selected(encode(64, 48, ImageFormat::Jpeg));
        let prepared = prepare_image(&image, &PrepareOptions::default()).unwrap();
        assert_eq!(prepared, image);
    }

    #[test]
    fn test_custom_max_dimension() {
        let image = selected(encode(300, 600, ImageFormat::Png));
        let options = PrepareOptions {
            max_dimension: 100,
            jpeg_quality: 70,
        };
        let prepared = prepare_image(&image, &options).unwrap();
        let decoded = image::load_from_memory(&prepared.data).unwrap();
        assert_eq!(decoded.dimensions(), (50, 100));
    }

    #[test]
    fn test_undecodable_image_is_sent_unchanged() {
        let image = SelectedImage {
            file_name: "palm.heic".to_string(),
            content_type: "image/heic".to_string(),
            data: b"not an image".to_vec(),
        };
        assert!(prepare_image(&image, &PrepareOptions::default()).is_err());
        assert_eq!(prepare_or_original(&image, &PrepareOptions::default()), image);
    }
}
