//! Per-file GPS resolution with a fallback from structured tags to raw EXIF bytes.

use crate::decoder::{DecodeError, ExifPayload, HeifMetadataSource, ImageDecoder, OpenedImage};
use crate::models::GpsCoordinate;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub struct MetadataResolver {
    decoder: Arc<dyn ImageDecoder>,
    heif: Option<Arc<dyn HeifMetadataSource>>,
}

impl MetadataResolver {
    pub fn new(decoder: Arc<dyn ImageDecoder>) -> Self {
        Self {
            decoder,
            heif: None,
        }
    }

    pub fn with_heif(mut self, heif: Arc<dyn HeifMetadataSource>) -> Self {
        self.heif = Some(heif);
        self
    }

    /// Resolves the GPS position of one image.
    ///
    /// Structured tags win when they carry GPS. Otherwise the first raw EXIF
    /// block found (container side channel, then the HEIF item scan) decides
    /// the result. An error is returned when the file could not be opened or
    /// its container decode failed, unless a raw block still yields GPS.
    /// Fallback sources are best effort; their failures are only logged.
    pub fn resolve(&self, path: &Path) -> Result<Option<GpsCoordinate>, DecodeError> {
        let mut failure = None;
        let mut image = match self.decoder.open(path) {
            Ok(image) => Some(image),
            Err(e) => {
                debug!("{}: open failed: {}", path.display(), e);
                failure = Some(e);
                None
            }
        };

        if let Some(image) = image.as_mut() {
            match image.tags() {
                Ok(Some(tags)) => {
                    if let Some(coordinate) = ExifPayload::Tags(tags).gps() {
                        return Ok(Some(coordinate));
                    }
                    debug!("{}: tag dictionary has no GPS", path.display());
                }
                Ok(None) => debug!("{}: no tag dictionary", path.display()),
                Err(e) => {
                    debug!("{}: tag dictionary unreadable: {}", path.display(), e);
                    failure = Some(e);
                }
            }
        }

        if let Some(bytes) = self.raw_block(path, image.as_deref_mut()) {
            debug!("{}: falling back to {} raw EXIF bytes", path.display(), bytes.len());
            if let Some(coordinate) = ExifPayload::Raw(bytes).gps() {
                return Ok(Some(coordinate));
            }
            debug!("{}: raw EXIF block has no usable GPS", path.display());
        }
        failure.map_or(Ok(None), Err)
    }

    fn raw_block(
        &self,
        path: &Path,
        image: Option<&mut (dyn OpenedImage + 'static)>,
    ) -> Option<Vec<u8>> {
        if let Some(image) = image {
            match image.raw_exif() {
                Ok(Some(bytes)) if !bytes.is_empty() => return Some(bytes),
                Ok(_) => {}
                Err(e) => debug!("{}: container EXIF chunk unreadable: {}", path.display(), e),
            }
        }

        let heif = self.heif.as_ref().filter(|_| is_heif(path))?;
        match heif.exif_block(path) {
            Ok(Some(bytes)) if !bytes.is_empty() => Some(bytes),
            Ok(_) => None,
            Err(e) => {
                debug!("{}: HEIF metadata scan failed: {}", path.display(), e);
                None
            }
        }
    }
}

fn is_heif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("heic") || e.eq_ignore_ascii_case("heif"))
        .unwrap_or(false)
}
