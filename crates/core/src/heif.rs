//! Exif metadata blocks of HEIF/HEIC files, read through libheif.

use crate::decoder::{DecodeError, HeifMetadataSource};
use libheif_rs::{HeifContext, ItemId};
use std::path::Path;

/// HEIF-specific metadata source used when the container decoder yields no GPS.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeifExifScanner;

impl HeifMetadataSource for HeifExifScanner {
    /// Returns the first non-empty `Exif` metadata block attached to the
    /// primary image, or `None` when it has none.
    fn exif_block(&self, path: &Path) -> Result<Option<Vec<u8>>, DecodeError> {
        let name = path
            .to_str()
            .ok_or_else(|| DecodeError::Heif(format!("non UTF-8 path {}", path.display())))?;
        let ctx = HeifContext::read_from_file(name).map_err(heif_error)?;
        let handle = ctx.primary_image_handle().map_err(heif_error)?;

        let count = handle.number_of_metadata_blocks(b"Exif");
        if count <= 0 {
            return Ok(None);
        }
        let mut ids: Vec<ItemId> = vec![0; count as usize];
        let found = handle.metadata_block_ids(&mut ids, b"Exif");
        ids.truncate(found);

        for id in ids {
            let block = handle.metadata(id).map_err(heif_error)?;
            if !block.is_empty() {
                return Ok(Some(block));
            }
        }
        Ok(None)
    }
}

fn heif_error(e: libheif_rs::HeifError) -> DecodeError {
    DecodeError::Heif(e.to_string())
}
