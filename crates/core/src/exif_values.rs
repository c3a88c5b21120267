//! Conversion from kamadak-exif fields into the crate's tag model.

use crate::rational::Scalar;
use crate::tags::{GpsTag, GpsTags, TagDictionary, TagValue, GPS_INFO_TAG};
use exif::{Context, Exif, In, Value};

/// How ASCII fields are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ascii {
    /// Decoded to a string, the way a container decoder hands them out.
    Text,
    /// Left as raw bytes, the way a bare EXIF parser hands them out.
    Bytes,
}

pub fn tag_value(value: &Value, ascii: Ascii) -> TagValue {
    match value {
        Value::Ascii(strings) => {
            let first = strings.first().cloned().unwrap_or_default();
            match ascii {
                Ascii::Text => TagValue::Text(String::from_utf8_lossy(&first).into_owned()),
                Ascii::Bytes => TagValue::Bytes(first),
            }
        }
        Value::Byte(b) => TagValue::Bytes(b.clone()),
        Value::Undefined(b, _) => TagValue::Bytes(b.clone()),
        Value::Rational(v) => TagValue::Scalars(
            v.iter()
                .map(|r| Scalar::ratio(i64::from(r.num), i64::from(r.denom)))
                .collect(),
        ),
        Value::SRational(v) => TagValue::Scalars(
            v.iter()
                .map(|r| Scalar::ratio(i64::from(r.num), i64::from(r.denom)))
                .collect(),
        ),
        Value::Short(v) => ints(v.iter().map(|x| i64::from(*x))),
        Value::Long(v) => ints(v.iter().map(|x| i64::from(*x))),
        Value::SByte(v) => ints(v.iter().map(|x| i64::from(*x))),
        Value::SShort(v) => ints(v.iter().map(|x| i64::from(*x))),
        Value::SLong(v) => ints(v.iter().map(|x| i64::from(*x))),
        Value::Float(v) => TagValue::Scalars(v.iter().map(|x| Scalar::Float(f64::from(*x))).collect()),
        Value::Double(v) => TagValue::Scalars(v.iter().map(|x| Scalar::Float(*x)).collect()),
        _ => TagValue::Bytes(Vec::new()),
    }
}

fn ints(values: impl Iterator<Item = i64>) -> TagValue {
    TagValue::Scalars(values.map(Scalar::Int).collect())
}

/// Primary-image fields keyed by tag number, with GPS fields nested under
/// the GPSInfo tag.
pub fn tag_dictionary(exif: &Exif) -> TagDictionary {
    let mut dict = TagDictionary::new();
    let mut gps = TagDictionary::new();
    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        let value = tag_value(&field.value, Ascii::Text);
        if field.tag.context() == Context::Gps {
            gps.insert(field.tag.number(), value);
        } else if field.tag.number() != GPS_INFO_TAG {
            dict.insert(field.tag.number(), value);
        }
    }
    if !gps.is_empty() {
        dict.insert(GPS_INFO_TAG, TagValue::Ifd(gps));
    }
    dict
}

/// GPS fields of a bare EXIF block, with reference letters left as bytes.
pub fn gps_tags(exif: &Exif) -> GpsTags {
    let mut gps = GpsTags::default();
    for field in exif
        .fields()
        .filter(|f| f.ifd_num == In::PRIMARY && f.tag.context() == Context::Gps)
    {
        if let Some(tag) = GpsTag::from_id(field.tag.number()) {
            gps.insert(tag, tag_value(&field.value, Ascii::Bytes));
        }
    }
    gps
}
