//! Image decoding collaborators and the capability registry.

use crate::gps;
use crate::models::GpsCoordinate;
use crate::resolver::MetadataResolver;
use crate::tags::TagDictionary;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid EXIF data: {0}")]
    Exif(String),
    #[error("cannot decode image container: {0}")]
    Container(String),
    #[error("cannot read HEIF metadata: {0}")]
    Heif(String),
}

/// EXIF data in whichever shape a source could provide.
#[derive(Debug, Clone, PartialEq)]
pub enum ExifPayload {
    Tags(TagDictionary),
    Raw(Vec<u8>),
}

impl ExifPayload {
    pub fn gps(&self) -> Option<GpsCoordinate> {
        match self {
            ExifPayload::Tags(tags) => gps::from_tag_dictionary(tags),
            ExifPayload::Raw(bytes) => gps::from_raw_exif(bytes),
        }
    }
}

/// Opens image files.
pub trait ImageDecoder: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn OpenedImage>, DecodeError>;
}

pub trait OpenedImage {
    /// Structured tags; `Ok(None)` when the container has no EXIF at all.
    fn tags(&mut self) -> Result<Option<TagDictionary>, DecodeError>;

    /// The raw EXIF chunk the container decoder exposes, if any.
    fn raw_exif(&mut self) -> Result<Option<Vec<u8>>, DecodeError>;
}

/// Format-specific scan for an embedded EXIF block in HEIF/HEIC files.
pub trait HeifMetadataSource: Send + Sync {
    fn exif_block(&self, path: &Path) -> Result<Option<Vec<u8>>, DecodeError>;
}

/// What this build can decode. Features decide which sources exist.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub decoder: Option<Arc<dyn ImageDecoder>>,
    pub heif: Option<Arc<dyn HeifMetadataSource>>,
}

impl Capabilities {
    pub fn detect() -> Self {
        #[cfg(feature = "exif")]
        let decoder: Option<Arc<dyn ImageDecoder>> = Some(Arc::new(ContainerDecoder));
        #[cfg(not(feature = "exif"))]
        let decoder: Option<Arc<dyn ImageDecoder>> = None;

        #[cfg(feature = "heif")]
        let heif: Option<Arc<dyn HeifMetadataSource>> = Some(Arc::new(crate::heif::HeifExifScanner));
        #[cfg(not(feature = "heif"))]
        let heif: Option<Arc<dyn HeifMetadataSource>> = None;

        Self { decoder, heif }
    }

    /// `None` when no container decoder is available.
    pub fn resolver(&self) -> Option<MetadataResolver> {
        let decoder = self.decoder.clone()?;
        let resolver = MetadataResolver::new(decoder);
        Some(match &self.heif {
            Some(heif) => resolver.with_heif(heif.clone()),
            None => resolver,
        })
    }
}

/// kamadak-exif for structured tags, plus the `image` crate's EXIF chunk
/// accessor when built with `image-meta`.
#[cfg(feature = "exif")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerDecoder;

#[cfg(feature = "exif")]
impl ImageDecoder for ContainerDecoder {
    fn open(&self, path: &Path) -> Result<Box<dyn OpenedImage>, DecodeError> {
        let bytes = std::fs::read(path)?;
        Ok(Box::new(ContainerImage { bytes }))
    }
}

#[cfg(feature = "exif")]
struct ContainerImage {
    bytes: Vec<u8>,
}

#[cfg(feature = "exif")]
impl OpenedImage for ContainerImage {
    fn tags(&mut self) -> Result<Option<TagDictionary>, DecodeError> {
        let mut cursor = std::io::Cursor::new(&self.bytes);
        match exif::Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => Ok(Some(crate::exif_values::tag_dictionary(&exif))),
            Err(exif::Error::NotFound(_)) => Ok(None),
            Err(e) => Err(DecodeError::Exif(e.to_string())),
        }
    }

    #[cfg(feature = "image-meta")]
    fn raw_exif(&mut self) -> Result<Option<Vec<u8>>, DecodeError> {
        use image::ImageDecoder as _;

        let reader = image::ImageReader::new(std::io::Cursor::new(&self.bytes)).with_guessed_format()?;
        if reader.format().is_none() {
            return Ok(None);
        }
        let mut decoder = reader
            .into_decoder()
            .map_err(|e| DecodeError::Container(e.to_string()))?;
        decoder
            .exif_metadata()
            .map_err(|e| DecodeError::Container(e.to_string()))
    }

    #[cfg(not(feature = "image-meta"))]
    fn raw_exif(&mut self) -> Result<Option<Vec<u8>>, DecodeError> {
        Ok(None)
    }
}

#[cfg(all(test, feature = "exif"))]
mod tests {
    use super::*;
    use crate::fixtures::{exif_block, jpeg_with_exif, GpsFixture};

    #[test]
    fn detect_provides_a_resolver() {
        let caps = Capabilities::detect();
        assert!(caps.decoder.is_some());
        assert!(caps.resolver().is_some());
        assert!(Capabilities::default().resolver().is_none());
    }

    #[test]
    fn container_decoder_reads_jpeg_gps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        let tiff = exif_block(&GpsFixture::new(10.5, "N", 20.25, "E"));
        std::fs::write(&path, jpeg_with_exif(&tiff)).unwrap();

        let mut image = ContainerDecoder.open(&path).unwrap();
        let tags = image.tags().unwrap().unwrap();
        let c = ExifPayload::Tags(tags).gps().unwrap();
        assert_eq!((c.latitude, c.longitude), (10.5, 20.25));
    }

    #[test]
    fn jpeg_without_exif_has_no_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.jpg");
        std::fs::write(&path, [0xff, 0xd8, 0xff, 0xd9]).unwrap();

        let mut image = ContainerDecoder.open(&path).unwrap();
        assert_eq!(image.tags().unwrap(), None);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let mut image = ContainerDecoder.open(&path).unwrap();
        assert!(matches!(image.tags(), Err(DecodeError::Exif(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ContainerDecoder
            .open(Path::new("/nonexistent/nowhere.jpg"))
            .err()
            .unwrap();
        assert!(matches!(err, DecodeError::Io(_)));
    }

    #[test]
    fn raw_payload_goes_through_raw_parser() {
        let tiff = exif_block(&GpsFixture::new(1.5, "S", 2.5, "W"));
        let c = ExifPayload::Raw(tiff).gps().unwrap();
        assert_eq!((c.latitude, c.longitude), (-1.5, -2.5));
    }
}
