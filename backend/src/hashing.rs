//! Hash & EXIF Service (C3): content-addressing and metadata extraction,
//! both pure functions over bytes so the ingestion engine can call them
//! before anything touches the database or file store.

use photosync_shared::entities::ExifData;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data` (§4.3 "`SHA256(bytes) -> hex string`").
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Best-effort EXIF extraction. Unreadable or absent EXIF is not an error —
/// callers get `ExifData::default()` (orientation 1, everything else
/// `None`) and ingestion proceeds (§4.3, §4.5 edge cases).
pub fn extract_exif(data: &[u8]) -> ExifData {
    let mut cursor = std::io::Cursor::new(data);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(reader) => reader,
        Err(e) => {
            log::debug!("[hashing] no readable EXIF: {e}");
            return ExifData::default();
        }
    };

    let mut out = ExifData::default();
    for field in reader.fields() {
        use exif::Tag;
        match field.tag {
            Tag::Make => out.camera_make = Some(field.display_value().to_string().trim().to_string()),
            Tag::Model => out.camera_model = Some(field.display_value().to_string().trim().to_string()),
            Tag::LensModel => out.lens_model = Some(field.display_value().to_string().trim().to_string()),
            Tag::FocalLength => out.focal_length = field.value.get_uint(0).map(|v| v as f64),
            Tag::FNumber => out.aperture = as_rational(&field.value),
            Tag::ExposureTime => out.shutter_speed = Some(field.display_value().to_string()),
            Tag::PhotographicSensitivity => out.iso = field.value.get_uint(0),
            Tag::Orientation => {
                if let Some(v) = field.value.get_uint(0) {
                    out.orientation = v as u16;
                }
            }
            Tag::GPSLatitude => out.latitude = gps_to_decimal(&field.value, &reader, exif::Tag::GPSLatitudeRef),
            Tag::GPSLongitude => out.longitude = gps_to_decimal(&field.value, &reader, exif::Tag::GPSLongitudeRef),
            Tag::GPSAltitude => out.altitude = as_rational(&field.value),
            Tag::DateTimeOriginal => {
                out.date_taken = parse_exif_datetime(&field.display_value().to_string());
            }
            _ => {}
        }
    }
    out
}

fn as_rational(value: &exif::Value) -> Option<f64> {
    match value {
        exif::Value::Rational(v) => v.first().map(|r| r.to_f64()),
        exif::Value::SRational(v) => v.first().map(|r| r.to_f64()),
        _ => None,
    }
}

fn gps_to_decimal(value: &exif::Value, reader: &exif::Reader, ref_tag: exif::Tag) -> Option<f64> {
    let exif::Value::Rational(parts) = value else { return None };
    if parts.len() < 3 {
        return None;
    }
    let degrees = parts[0].to_f64() + parts[1].to_f64() / 60.0 + parts[2].to_f64() / 3600.0;
    let negative = reader
        .get_field(ref_tag, exif::In::PRIMARY)
        .map(|f| f.display_value().to_string())
        .map(|s| s.starts_with('S') || s.starts_with('W'))
        .unwrap_or(false);
    Some(if negative { -degrees } else { degrees })
}

fn parse_exif_datetime(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    // EXIF DateTimeOriginal is "YYYY:MM:DD HH:MM:SS" with no timezone;
    // treated as UTC since the spec's `dateTaken` is itself timezone-naive
    // in intent (§3, §9).
    chrono::NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S")
        .ok()
        .map(|ndt| ndt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_deterministic_and_content_sensitive() {
        let a = sha256_hex(b"hello");
        let b = sha256_hex(b"hello");
        let c = sha256_hex(b"hellp");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn missing_exif_yields_defaults() {
        let exif = extract_exif(b"not an image");
        assert_eq!(exif.orientation, 1);
        assert!(exif.camera_make.is_none());
    }
}
