//! GPS extraction from a structured tag dictionary or a raw EXIF block.

use crate::dms;
use crate::models::GpsCoordinate;
use crate::rational;
use crate::tags::{GpsTag, GpsTags, TagDictionary};

/// Extracts a coordinate from a container decoder's tag dictionary.
pub fn from_tag_dictionary(tags: &TagDictionary) -> Option<GpsCoordinate> {
    let ifd = tags.gps_ifd()?;
    from_gps_tags(&GpsTags::from_ifd(ifd))
}

/// Extracts a coordinate from a raw EXIF block. Corrupt or empty blocks are `None`.
#[cfg(feature = "exif")]
pub fn from_raw_exif(bytes: &[u8]) -> Option<GpsCoordinate> {
    let tiff = tiff_payload(bytes)?;
    let exif = match exif::Reader::new().read_raw(tiff.to_vec()) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!("raw exif block rejected: {}", e);
            return None;
        }
    };
    let gps = crate::exif_values::gps_tags(&exif);
    if gps.is_empty() {
        return None;
    }
    from_gps_tags(&gps)
}

#[cfg(not(feature = "exif"))]
pub fn from_raw_exif(_bytes: &[u8]) -> Option<GpsCoordinate> {
    None
}

/// Latitude and longitude are mandatory; altitude is kept only when it converts.
pub fn from_gps_tags(gps: &GpsTags) -> Option<GpsCoordinate> {
    let latitude = coordinate(gps, GpsTag::Latitude, GpsTag::LatitudeRef)?;
    let longitude = coordinate(gps, GpsTag::Longitude, GpsTag::LongitudeRef)?;
    Some(GpsCoordinate {
        latitude,
        longitude,
        altitude: altitude(gps),
    })
}

fn coordinate(gps: &GpsTags, value: GpsTag, reference: GpsTag) -> Option<f64> {
    let Some(dms) = gps.get(value).and_then(|v| v.scalars()) else {
        tracing::debug!("{} missing or not numeric", value.name());
        return None;
    };
    let reference = gps.get(reference).and_then(|r| r.as_reference());
    let decimal = dms::to_decimal(dms, reference.as_deref());
    if decimal.is_none() {
        tracing::debug!("{} is not a degrees/minutes/seconds triple", value.name());
    }
    decimal
}

// Ref 1 is below sea level; 0 or a missing ref is above.
fn altitude(gps: &GpsTags) -> Option<f64> {
    let a = rational::to_f64(&gps.get(GpsTag::Altitude)?.first_scalar()?)?;
    let below = gps
        .get(GpsTag::AltitudeRef)
        .and_then(|r| r.first_scalar())
        .and_then(|s| rational::to_f64(&s))
        == Some(1.0);
    Some(if below { -a } else { a })
}

/// Locates the TIFF header inside a raw EXIF block.
///
/// Accepts a bare TIFF stream, an APP1-style `Exif\0\0` prefix, or a HEIF
/// Exif item that starts with a 4-byte big-endian offset to the header.
pub fn tiff_payload(bytes: &[u8]) -> Option<&[u8]> {
    const EXIF_ID: &[u8] = b"Exif\0\0";
    if is_tiff_header(bytes) {
        return Some(bytes);
    }
    if let Some(rest) = bytes.strip_prefix(EXIF_ID) {
        return is_tiff_header(rest).then_some(rest);
    }
    let offset = u32::from_be_bytes(bytes.get(..4)?.try_into().ok()?) as usize;
    let rest = bytes.get(4usize.checked_add(offset)?..)?;
    if is_tiff_header(rest) {
        return Some(rest);
    }
    // Some writers count the offset up to the Exif identifier rather than past it.
    rest.strip_prefix(EXIF_ID).filter(|r| is_tiff_header(r))
}

fn is_tiff_header(bytes: &[u8]) -> bool {
    bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*")
}
