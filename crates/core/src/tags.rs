//! Structured EXIF tag dictionary and the GPS tag table.

use crate::rational::Scalar;
use std::collections::{BTreeMap, HashMap};

/// Tag id of the GPS sub-IFD pointer in IFD0.
pub const GPS_INFO_TAG: u16 = 0x8825;

#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Scalars(Vec<Scalar>),
    Text(String),
    Bytes(Vec<u8>),
    Ifd(TagDictionary),
}

/// Mapping from numeric tag id to value for one IFD.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagDictionary(BTreeMap<u16, TagValue>);

impl TagDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: u16, value: TagValue) {
        self.0.insert(tag, value);
    }

    pub fn get(&self, tag: u16) -> Option<&TagValue> {
        self.0.get(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &TagValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    /// The nested GPS IFD, if present and dictionary-shaped.
    pub fn gps_ifd(&self) -> Option<&TagDictionary> {
        match self.get(GPS_INFO_TAG)? {
            TagValue::Ifd(ifd) => Some(ifd),
            _ => None,
        }
    }
}

impl FromIterator<(u16, TagValue)> for TagDictionary {
    fn from_iter<I: IntoIterator<Item = (u16, TagValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpsTag {
    LatitudeRef,
    Latitude,
    LongitudeRef,
    Longitude,
    AltitudeRef,
    Altitude,
}

const GPS_TAG_IDS: &[(u16, GpsTag)] = &[
    (1, GpsTag::LatitudeRef),
    (2, GpsTag::Latitude),
    (3, GpsTag::LongitudeRef),
    (4, GpsTag::Longitude),
    (5, GpsTag::AltitudeRef),
    (6, GpsTag::Altitude),
];

impl GpsTag {
    pub fn from_id(id: u16) -> Option<Self> {
        GPS_TAG_IDS
            .iter()
            .find(|(tag_id, _)| *tag_id == id)
            .map(|(_, tag)| *tag)
    }

    pub fn name(self) -> &'static str {
        match self {
            GpsTag::LatitudeRef => "GPSLatitudeRef",
            GpsTag::Latitude => "GPSLatitude",
            GpsTag::LongitudeRef => "GPSLongitudeRef",
            GpsTag::Longitude => "GPSLongitude",
            GpsTag::AltitudeRef => "GPSAltitudeRef",
            GpsTag::Altitude => "GPSAltitude",
        }
    }
}

/// GPS fields keyed by symbolic name. Both extraction paths reduce to this.
#[derive(Debug, Clone, Default)]
pub struct GpsTags(HashMap<GpsTag, TagValue>);

impl GpsTags {
    /// Remaps a GPS IFD by id; ids outside the table are dropped.
    pub fn from_ifd(ifd: &TagDictionary) -> Self {
        Self(
            ifd.iter()
                .filter_map(|(id, v)| GpsTag::from_id(id).map(|tag| (tag, v.clone())))
                .collect(),
        )
    }

    pub fn insert(&mut self, tag: GpsTag, value: TagValue) {
        self.0.insert(tag, value);
    }

    pub fn get(&self, tag: GpsTag) -> Option<&TagValue> {
        self.0.get(&tag)
    }

    pub fn contains(&self, tag: GpsTag) -> bool {
        self.0.contains_key(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TagValue {
    pub fn scalars(&self) -> Option<&[Scalar]> {
        match self {
            TagValue::Scalars(v) => Some(v),
            _ => None,
        }
    }

    /// First component as a scalar; single bytes count as integers.
    pub fn first_scalar(&self) -> Option<Scalar> {
        match self {
            TagValue::Scalars(v) => v.first().cloned(),
            TagValue::Bytes(b) => b.first().map(|b| Scalar::Int(i64::from(*b))),
            TagValue::Text(s) => Some(Scalar::Text(s.clone())),
            TagValue::Ifd(_) => None,
        }
    }

    /// Reference letters. Raw bytes are decoded as ASCII, dropping anything
    /// that is not; trailing NULs and whitespace are trimmed.
    pub fn as_reference(&self) -> Option<String> {
        let s: String = match self {
            TagValue::Text(s) => s.clone(),
            TagValue::Bytes(b) => b.iter().filter(|c| c.is_ascii()).map(|c| *c as char).collect(),
            _ => return None,
        };
        let trimmed = s.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}
