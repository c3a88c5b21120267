//! Core library: EXIF GPS extraction, folder scanning and KML generation.

pub mod config;
pub mod decoder;
pub mod dms;
#[cfg(feature = "exif")]
pub mod exif_values;
#[cfg(all(feature = "exif", any(test, feature = "test-support")))]
pub mod fixtures;
pub mod gps;
#[cfg(feature = "heif")]
pub mod heif;
pub mod kml;
pub mod models;
pub mod rational;
pub mod resolver;
pub mod scanner;
pub mod tags;

pub use decoder::{Capabilities, DecodeError, ExifPayload};
pub use models::{GpsCoordinate, Placemark, ScanCounters};
pub use resolver::MetadataResolver;
pub use scanner::{scan, scan_with, FileWarning, ScanReport};
