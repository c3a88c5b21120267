use std::path::{Path, PathBuf};

/// Canonical form of `folder`, or `None` unless it is an existing directory.
pub fn resolve_folder(folder: &Path) -> Option<PathBuf> {
    let folder = folder.canonicalize().ok()?;
    folder.is_dir().then_some(folder)
}

/// Final path component, used for the default output name and the document title.
pub fn folder_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "images".to_string())
}

/// `<folder>/<folder-name>_images.kml`
pub fn default_output(folder: &Path) -> PathBuf {
    folder.join(format!("{}_images.kml", folder_name(folder)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_lives_inside_the_folder() {
        let folder = Path::new("/photos/Trip 2024");
        assert_eq!(
            default_output(folder),
            PathBuf::from("/photos/Trip 2024/Trip 2024_images.kml")
        );
    }

    #[test]
    fn only_existing_directories_resolve() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("a.jpg");
        std::fs::write(&file, b"x").unwrap();

        assert!(resolve_folder(temp.path()).is_some());
        assert!(resolve_folder(&file).is_none());
        assert!(resolve_folder(&temp.path().join("missing")).is_none());
    }
}
