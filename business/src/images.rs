//! Upload validation and client-side compression.
//!
//! Files are checked against the declared MIME type and the size cap, then
//! shrunk to fit [`MAX_DIMENSION`] and [`TARGET_BYTES`] before they leave
//! the machine. Data URL helpers live here too since generated composites
//! arrive that way.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GenericImageView as _, ImageEncoder as _, ImageFormat};
use log::debug;
use thiserror::Error;

pub const JPEG: &str = "image/jpeg";
pub const PNG: &str = "image/png";
pub const ALLOWED_TYPES: [&str; 2] = [JPEG, PNG];

/// Uploads at or above this size are refused outright.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
/// Compressed output must fit in this.
pub const TARGET_BYTES: usize = 2 * 1024 * 1024;
/// Longest side after compression.
pub const MAX_DIMENSION: u32 = 1920;

const JPEG_QUALITY_STEPS: [u8; 6] = [90, 80, 70, 60, 50, 40];
const DOWNSCALE_FACTOR: f64 = 0.75;
const MIN_DIMENSION: u32 = 320;

pub const INVALID_TYPE_MESSAGE: &str = "Only JPEG and PNG images are allowed";
pub const TOO_LARGE_MESSAGE: &str = "Image must be less than 5MB";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// Shown next to the file picker as-is.
    #[error("{0}")]
    Validation(String),
    #[error("Failed to compress image: {0}")]
    Compression(String),
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
}

/// An image held in memory, named like the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn to_data_url(&self) -> String {
        to_data_url(&self.mime_type, &self.bytes)
    }
}

/// Accepts only JPEG or PNG strictly below [`MAX_UPLOAD_BYTES`]; the name's
/// extension plays no part.
pub fn validate(file: &ImageFile) -> Result<(), ImageError> {
    if !ALLOWED_TYPES.contains(&file.mime_type.as_str()) {
        return Err(ImageError::Validation(INVALID_TYPE_MESSAGE.to_owned()));
    }
    if file.size() >= MAX_UPLOAD_BYTES {
        return Err(ImageError::Validation(TOO_LARGE_MESSAGE.to_owned()));
    }
    Ok(())
}

/// MIME type from the leading bytes, if it is a format we accept.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Jpeg => Some(JPEG),
        ImageFormat::Png => Some(PNG),
        _ => None,
    }
}

/// `png` for PNG, `jpg` for everything else.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    if mime_type.eq_ignore_ascii_case(PNG) {
        "png"
    } else {
        "jpg"
    }
}

pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Decodes `data:<mime>;base64,<payload>` into its MIME type and raw bytes.
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>), ImageError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ImageError::InvalidDataUrl("missing data: prefix".to_owned()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::InvalidDataUrl("missing payload".to_owned()))?;
    let mime_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| ImageError::InvalidDataUrl("payload is not base64".to_owned()))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|err| ImageError::InvalidDataUrl(err.to_string()))?;
    Ok((mime_type.to_owned(), bytes))
}

fn format_for(mime_type: &str) -> Option<ImageFormat> {
    match mime_type {
        JPEG => Some(ImageFormat::Jpeg),
        PNG => Some(ImageFormat::Png),
        _ => None,
    }
}

fn fits_dimensions(image: &DynamicImage) -> bool {
    let (width, height) = image.dimensions();
    width.max(height) <= MAX_DIMENSION
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|err| ImageError::Compression(err.to_string()))?;
    Ok(out)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|err| ImageError::Compression(err.to_string()))?;
    Ok(out)
}

fn renamed(name: &str, extension: &str) -> String {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    format!("{stem}.{extension}")
}

/// Validates, then shrinks `file` to the dimension and byte targets.
///
/// Files already inside both targets come back untouched. Otherwise the
/// image is resized to fit, PNG is re-encoded as PNG if that fits, and
/// JPEG quality is stepped down, then the image is downscaled, until the
/// output fits. A PNG that cannot fit becomes a JPEG.
pub fn compress(file: &ImageFile) -> Result<ImageFile, ImageError> {
    validate(file)?;
    let format = format_for(&file.mime_type)
        .ok_or_else(|| ImageError::Validation(INVALID_TYPE_MESSAGE.to_owned()))?;

    let mut image = image::load_from_memory_with_format(&file.bytes, format)
        .map_err(|err| ImageError::Compression(err.to_string()))?;

    if file.size() <= TARGET_BYTES && fits_dimensions(&image) {
        return Ok(file.clone());
    }

    if !fits_dimensions(&image) {
        image = image.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3);
    }

    if format == ImageFormat::Png {
        let png = encode_png(&image)?;
        if png.len() <= TARGET_BYTES {
            debug!("Compressed {} to {} bytes as PNG", file.name, png.len());
            return Ok(ImageFile::new(file.name.clone(), PNG, png));
        }
    }

    loop {
        for quality in JPEG_QUALITY_STEPS {
            let jpeg = encode_jpeg(&image, quality)?;
            if jpeg.len() <= TARGET_BYTES {
                debug!(
                    "Compressed {} to {} bytes as JPEG q{quality} at {}x{}",
                    file.name,
                    jpeg.len(),
                    image.width(),
                    image.height()
                );
                return Ok(ImageFile::new(renamed(&file.name, "jpg"), JPEG, jpeg));
            }
        }

        let (width, height) = image.dimensions();
        let next_width = (f64::from(width) * DOWNSCALE_FACTOR) as u32;
        let next_height = (f64::from(height) * DOWNSCALE_FACTOR) as u32;
        if next_width.min(next_height) < MIN_DIMENSION {
            return Err(ImageError::Compression(
                "image cannot be reduced below 2MB".to_owned(),
            ));
        }
        image = image.resize_exact(next_width, next_height, FilterType::Triangle);
    }
}
