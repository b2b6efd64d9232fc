use std::io::Cursor;

use anyhow::{Result, anyhow};
use image::{ImageFormat, ImageReader};

/// Smallest side the upload form recommends for a base photo.
pub const MIN_RECOMMENDED_SIDE: u32 = 1080;

/// Reads the size from the image header; pixel data is never decoded.
pub fn get_dimensions(bytes: &[u8], mime_type: &str) -> Result<(u32, u32)> {
    let format = mime_to_format(mime_type)?;
    ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|err| anyhow!("read image header failed: {err}"))
}

pub fn detect_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    None
}

pub fn mime_to_format(mime_type: &str) -> Result<ImageFormat> {
    match mime_type {
        "image/png" => Ok(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Ok(ImageFormat::Jpeg),
        "image/webp" => Ok(ImageFormat::WebP),
        _ => Err(anyhow!("unsupported mime type: {mime_type}")),
    }
}

/// True when either side is below [`MIN_RECOMMENDED_SIDE`]. Undecodable
/// payloads are not reported as small.
pub fn is_below_recommended_size(bytes: &[u8], mime_type: &str) -> bool {
    match get_dimensions(bytes, mime_type) {
        Ok((width, height)) => width < MIN_RECOMMENDED_SIDE || height < MIN_RECOMMENDED_SIDE,
        Err(err) => {
            tracing::debug!("could not read image dimensions: {err}");
            false
        }
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
    let mut output = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .expect("encode png");
    output
}
