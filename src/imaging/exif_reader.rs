//! EXIF extraction into a [`MetadataRecord`].
//!
//! Reads the primary IFD (and the Exif sub-IFD, which `kamadak-exif` folds
//! into it) from any container the crate understands: JPEG, TIFF, PNG, WebP,
//! HEIF. Only the fields the caption and orientation handling need are kept.
//!
//! Values are taken as stored; the normalizer decides what counts as absent
//! (e.g. a zero exposure time).

use crate::metadata::MetadataRecord;
use exif::{Exif, In, Tag, Value};
use std::io::Cursor;

/// Parse EXIF from raw file bytes.
///
/// Returns `exif::Error::NotFound` for files that simply carry no EXIF block.
pub fn read_exif(bytes: &[u8]) -> Result<MetadataRecord, exif::Error> {
    let exif = exif::Reader::new().read_from_container(&mut Cursor::new(bytes))?;
    Ok(record_from_exif(&exif))
}

/// Orientation code (1–8) or `None` if absent or unreadable.
pub fn read_orientation(bytes: &[u8]) -> Option<u16> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;
    get_u32(&exif, Tag::Orientation).and_then(|o| u16::try_from(o).ok())
}

fn record_from_exif(exif: &Exif) -> MetadataRecord {
    MetadataRecord {
        make: get_string(exif, Tag::Make),
        model: get_string(exif, Tag::Model),
        lens_description: get_string(exif, Tag::LensModel),
        f_number: get_rational_f64(exif, Tag::FNumber),
        exposure_time_seconds: get_rational_f64(exif, Tag::ExposureTime),
        iso: get_u32(exif, Tag::PhotographicSensitivity),
        focal_length_mm: get_rational_f64(exif, Tag::FocalLength),
        focal_length_35mm_mm: get_u32(exif, Tag::FocalLengthIn35mmFilm).map(f64::from),
        capture_timestamp: get_string(exif, Tag::DateTimeOriginal)
            .or_else(|| get_string(exif, Tag::DateTime)),
        pixel_width: get_u32(exif, Tag::PixelXDimension)
            .or_else(|| get_u32(exif, Tag::ImageWidth)),
        pixel_height: get_u32(exif, Tag::PixelYDimension)
            .or_else(|| get_u32(exif, Tag::ImageLength)),
        orientation: get_u32(exif, Tag::Orientation).and_then(|o| u16::try_from(o).ok()),
    }
}

fn get_string(exif: &Exif, tag: Tag) -> Option<String> {
    exif.get_field(tag, In::PRIMARY).and_then(|f| match f.value {
        Value::Ascii(ref parts) => parts
            .first()
            .map(|bytes| {
                String::from_utf8_lossy(bytes)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string()
            })
            .filter(|s| !s.is_empty()),
        _ => None,
    })
}

fn get_u32(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY).and_then(|f| match f.value {
        Value::Short(ref v) => v.first().map(|&x| x as u32),
        Value::Long(ref v) => v.first().copied(),
        _ => None,
    })
}

fn get_rational_f64(exif: &Exif, tag: Tag) -> Option<f64> {
    exif.get_field(tag, In::PRIMARY).and_then(|f| match f.value {
        Value::Rational(ref v) => v
            .first()
            .filter(|r| r.denom != 0)
            .map(|r| r.num as f64 / r.denom as f64),
        Value::SRational(ref v) => v
            .first()
            .filter(|r| r.denom != 0)
            .map(|r| r.num as f64 / r.denom as f64),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::exif_tiff;
    use exif::{Field, Rational};

    fn ascii(tag: Tag, s: &str) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![s.as_bytes().to_vec()]),
        }
    }

    fn rational(tag: Tag, num: u32, denom: u32) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Rational(vec![Rational { num, denom }]),
        }
    }

    fn short(tag: Tag, v: u16) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Short(vec![v]),
        }
    }

    #[test]
    fn reads_camera_and_exposure_fields() {
        let bytes = exif_tiff(&[
            ascii(Tag::Make, "SONY"),
            ascii(Tag::Model, "ILCE-7M4"),
            rational(Tag::FNumber, 18, 10),
            rational(Tag::ExposureTime, 1, 250),
            short(Tag::PhotographicSensitivity, 400),
            rational(Tag::FocalLength, 50, 1),
            short(Tag::FocalLengthIn35mmFilm, 75),
            short(Tag::Orientation, 6),
        ]);

        let record = read_exif(&bytes).unwrap();
        assert_eq!(record.make.as_deref(), Some("SONY"));
        assert_eq!(record.model.as_deref(), Some("ILCE-7M4"));
        assert_eq!(record.f_number, Some(1.8));
        assert_eq!(record.exposure_time_seconds, Some(0.004));
        assert_eq!(record.iso, Some(400));
        assert_eq!(record.focal_length_mm, Some(50.0));
        assert_eq!(record.focal_length_35mm_mm, Some(75.0));
        assert_eq!(record.orientation, Some(6));
        assert_eq!(read_orientation(&bytes), Some(6));
    }

    #[test]
    fn zero_denominator_is_absent() {
        let bytes = exif_tiff(&[rational(Tag::FNumber, 18, 0)]);
        let record = read_exif(&bytes).unwrap();
        assert_eq!(record.f_number, None);
    }

    #[test]
    fn trailing_nul_and_spaces_are_trimmed() {
        let bytes = exif_tiff(&[ascii(Tag::Make, "Canon  \0")]);
        let record = read_exif(&bytes).unwrap();
        assert_eq!(record.make.as_deref(), Some("Canon"));
    }

    #[test]
    fn timestamp_falls_back_to_datetime() {
        let bytes = exif_tiff(&[ascii(Tag::DateTime, "2024:03:15 10:30:00")]);
        let record = read_exif(&bytes).unwrap();
        assert_eq!(
            record.capture_timestamp.as_deref(),
            Some("2024:03:15 10:30:00")
        );
    }

    #[test]
    fn garbage_bytes_error() {
        assert!(read_exif(b"definitely not an image").is_err());
        assert_eq!(read_orientation(b"nope"), None);
    }

    #[test]
    fn jpeg_without_exif_errors() {
        let bytes = crate::test_helpers::jpeg_bytes(16, 16);
        assert!(read_exif(&bytes).is_err());
    }
}
