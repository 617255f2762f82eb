//! Thumbnail Pipeline (C4): three bounding-box-resized WebP variants per
//! photo, generated after the photo row commits. Decoding and resizing
//! reuse the teacher's `image_processing` pattern (Lanczos3 resize, WebP
//! encode via `DynamicImage::write_to`) generalized from a fixed-aspect
//! avatar/wallpaper crop to an orientation-aware, aspect-preserving
//! bounding box fit.

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, imageops::FilterType};
use thiserror::Error;

/// Longest-edge bounding box, in pixels, for each thumbnail tier (§4.4).
pub const SMALL_MAX_EDGE: u32 = 256;
pub const MEDIUM_MAX_EDGE: u32 = 1024;
pub const LARGE_MAX_EDGE: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageInputFormat {
    Jpeg,
    Png,
    Webp,
}

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("unsupported or unrecognized image format for thumbnailing")]
    UnsupportedFormat,
    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("WebP encode error: {0}")]
    Encode(String),
}

#[derive(Debug)]
pub struct ThumbnailSet {
    pub small: Bytes,
    pub medium: Bytes,
    pub large: Bytes,
    /// Dimensions of the orientation-corrected original (§4.4 "photo
    /// width/height" reported to clients matches what they'd see rendered).
    pub width: u32,
    pub height: u32,
}

/// Magic-byte sniff, same three formats the teacher recognized. Anything
/// else (HEIC without a codec, video, corrupt data) is `None` and the
/// caller skips thumbnailing rather than failing ingestion (§4.4 edge
/// case: "an unsupported or corrupt image...leaves thumbnail fields null").
pub fn detect_format(bytes: &[u8]) -> Option<ImageInputFormat> {
    if bytes.len() < 12 {
        return None;
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageInputFormat::Jpeg);
    }
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(ImageInputFormat::Png);
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some(ImageInputFormat::Webp);
    }
    None
}

/// Decodes `raw`, applies the EXIF `orientation` transform so the stored
/// thumbnails are always "upright", and produces three bounding-box-fit
/// WebP variants. Upscaling is not applied — an image smaller than a tier's
/// box is emitted at its own size for that tier.
pub fn generate(raw: &[u8], orientation: u16) -> Result<ThumbnailSet, ThumbnailError> {
    detect_format(raw).ok_or(ThumbnailError::UnsupportedFormat)?;
    let img = image::load_from_memory(raw)?;
    let img = apply_orientation(img, orientation);
    let (width, height) = img.dimensions();

    let small = encode_webp(&fit_within(&img, SMALL_MAX_EDGE))?;
    let medium = encode_webp(&fit_within(&img, MEDIUM_MAX_EDGE))?;
    let large = encode_webp(&fit_within(&img, LARGE_MAX_EDGE))?;

    Ok(ThumbnailSet { small, medium, large, width, height })
}

/// Resizes `img` to fit within a `max_edge` x `max_edge` box, preserving
/// aspect ratio. No-op if the image already fits.
fn fit_within(img: &DynamicImage, max_edge: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_edge && height <= max_edge {
        return img.clone();
    }
    let (target_w, target_h) = if width >= height {
        let h = (height as u64 * max_edge as u64 / width as u64).max(1) as u32;
        (max_edge, h)
    } else {
        let w = (width as u64 * max_edge as u64 / height as u64).max(1) as u32;
        (w, max_edge)
    };
    img.resize(target_w, target_h, FilterType::Lanczos3)
}

/// EXIF orientation values 1-8 (TIFF/EXIF spec); 1 (or anything
/// unrecognized) is a no-op.
fn apply_orientation(img: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

fn encode_webp(img: &DynamicImage) -> Result<Bytes, ThumbnailError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::WebP)
        .map_err(|e| ThumbnailError::Encode(e.to_string()))?;
    Ok(Bytes::from(buf.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_image_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(w, h);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    #[test]
    fn detects_known_formats_and_rejects_garbage() {
        let jpeg = make_image_bytes(10, 10);
        assert_eq!(detect_format(&jpeg), Some(ImageInputFormat::Jpeg));
        assert_eq!(detect_format(b"not an image"), None);
    }

    #[test]
    fn fit_within_preserves_aspect_and_never_upscales() {
        let landscape = DynamicImage::new_rgb8(4000, 2000);
        let fitted = fit_within(&landscape, SMALL_MAX_EDGE);
        assert_eq!(fitted.dimensions(), (SMALL_MAX_EDGE, SMALL_MAX_EDGE / 2));

        let tiny = DynamicImage::new_rgb8(100, 50);
        let fitted = fit_within(&tiny, SMALL_MAX_EDGE);
        assert_eq!(fitted.dimensions(), (100, 50));
    }

    #[test]
    fn generate_produces_three_tiers() {
        let raw = make_image_bytes(3000, 1500);
        let set = generate(&raw, 1).unwrap();
        assert_eq!(set.width, 3000);
        assert_eq!(set.height, 1500);
        assert!(!set.small.is_empty());
        assert!(!set.medium.is_empty());
        assert!(!set.large.is_empty());
    }

    #[test]
    fn unsupported_format_is_skipped_not_errored_out_of_band() {
        let err = generate(b"clearly not an image", 1).unwrap_err();
        assert!(matches!(err, ThumbnailError::UnsupportedFormat));
    }
}
