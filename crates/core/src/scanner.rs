//! Walks a folder for images, resolves their GPS positions and collects placemarks.

use crate::config::ScanConfig;
use crate::models::{Placemark, ScanCounters};
use crate::resolver::MetadataResolver;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Recognised image extensions, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "tif", "tiff", "heic", "heif"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWarning {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub placemarks: Vec<Placemark>,
    pub counters: ScanCounters,
    pub warnings: Vec<FileWarning>,
}

#[derive(Debug)]
enum Outcome {
    Located(Placemark),
    NoGps,
    Failed(FileWarning),
    Unreadable(FileWarning),
}

impl ScanReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Located(pm) => {
                self.counters.total += 1;
                self.counters.with_gps += 1;
                self.placemarks.push(pm);
            }
            Outcome::NoGps => {
                self.counters.total += 1;
                self.counters.skipped += 1;
            }
            Outcome::Failed(w) => {
                self.counters.total += 1;
                self.counters.skipped += 1;
                self.warnings.push(w);
            }
            // Not known to be an image, so it stays out of the counters.
            Outcome::Unreadable(w) => self.warnings.push(w),
        }
    }
}

/// Scans `root` recursively. Per-file failures are recorded, never returned.
pub async fn scan(
    root: &Path,
    cfg: &ScanConfig,
    resolver: Arc<MetadataResolver>,
) -> anyhow::Result<ScanReport> {
    scan_with(root, cfg, resolver, |_| {}).await
}

/// Like [`scan`], calling `on_warning` for each warning as soon as it is produced.
pub async fn scan_with(
    root: &Path,
    cfg: &ScanConfig,
    resolver: Arc<MetadataResolver>,
    mut on_warning: impl FnMut(&FileWarning),
) -> anyhow::Result<ScanReport> {
    let (tx, mut rx) = mpsc::channel(100);
    let exclude_set = build_globset(&cfg.exclude)?;
    let follow_links = cfg.follow_links;
    let root = root.to_path_buf();
    info!("Scanning {}", root.display());

    // Walker task
    let walker_root = root.clone();
    let walker_handle = task::spawn_blocking(move || {
        let root = walker_root;
        for entry in WalkDir::new(&root)
            .follow_links(follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_excluded(&root, e.path(), &exclude_set))
        {
            let outcome = match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if !path.is_file() || !is_image(path) {
                        continue;
                    }
                    examine(&root, path, &resolver)
                }
                Err(e) => {
                    let path = e.path().unwrap_or(root.as_path()).to_path_buf();
                    warn!("walk error at {}: {}", path.display(), e);
                    Outcome::Unreadable(FileWarning {
                        path,
                        message: e.to_string(),
                    })
                }
            };

            if tx.blocking_send(outcome).is_err() {
                // Receiver dropped, stop walking.
                break;
            }
        }
    });

    let mut report = ScanReport::default();
    while let Some(outcome) = rx.recv().await {
        if let Outcome::Failed(w) | Outcome::Unreadable(w) = &outcome {
            on_warning(w);
        }
        report.record(outcome);
    }

    walker_handle.await?;
    info!(
        "Scan complete. {} images, {} with GPS, {} skipped.",
        report.counters.total, report.counters.with_gps, report.counters.skipped
    );
    Ok(report)
}

fn examine(root: &Path, path: &Path, resolver: &MetadataResolver) -> Outcome {
    // Decoder panics on hostile input must not end the scan.
    let resolved = panic::catch_unwind(AssertUnwindSafe(|| resolver.resolve(path)));
    match resolved {
        Ok(Ok(Some(c))) => Outcome::Located(Placemark {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            lat: c.latitude,
            lon: c.longitude,
            alt: c.altitude,
            desc: path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned(),
        }),
        Ok(Ok(None)) => {
            debug!("{}: no GPS", path.display());
            Outcome::NoGps
        }
        Ok(Err(e)) => {
            warn!("{}: {}", path.display(), e);
            Outcome::Failed(FileWarning {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
        Err(_) => {
            warn!("{}: decoder panicked", path.display());
            Outcome::Failed(FileWarning {
                path: path.to_path_buf(),
                message: "decoder panicked".to_string(),
            })
        }
    }
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

fn is_excluded(root: &Path, path: &Path, excludes: &GlobSet) -> bool {
    excludes.is_match(path.strip_prefix(root).unwrap_or(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{DecodeError, ImageDecoder, OpenedImage};
    use crate::rational::Scalar;
    use crate::tags::{TagDictionary, TagValue, GPS_INFO_TAG};
    use std::fs;

    /// Decodes file contents of the form `gps:<lat>,<lon>`; `bad` fails; anything else has no EXIF.
    struct TextDecoder;

    struct TextImage(String);

    impl ImageDecoder for TextDecoder {
        fn open(&self, path: &Path) -> Result<Box<dyn OpenedImage>, DecodeError> {
            Ok(Box::new(TextImage(fs::read_to_string(path)?)))
        }
    }

    impl OpenedImage for TextImage {
        fn tags(&mut self) -> Result<Option<TagDictionary>, DecodeError> {
            if self.0 == "bad" {
                return Err(DecodeError::Exif("corrupt IFD".into()));
            }
            if self.0 == "panic" {
                panic!("decoder bug");
            }
            let Some((lat, lon)) = self.0.strip_prefix("gps:").and_then(|s| s.split_once(',')) else {
                return Ok(None);
            };
            let dms = |v: &str| {
                TagValue::Scalars(vec![Scalar::Text(v.into()), Scalar::Int(0), Scalar::Int(0)])
            };
            let gps: TagDictionary = [(2, dms(lat)), (4, dms(lon))].into_iter().collect();
            let mut tags = TagDictionary::new();
            tags.insert(GPS_INFO_TAG, TagValue::Ifd(gps));
            Ok(Some(tags))
        }

        fn raw_exif(&mut self) -> Result<Option<Vec<u8>>, DecodeError> {
            Ok(None)
        }
    }

    fn resolver() -> Arc<MetadataResolver> {
        Arc::new(MetadataResolver::new(Arc::new(TextDecoder)))
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn recognises_extensions_case_insensitively() {
        for name in ["a.jpg", "b.JPEG", "c.Tif", "d.tiff", "e.HEIC", "f.heif"] {
            assert!(is_image(Path::new(name)), "{name}");
        }
        for name in ["a.png", "b.jpg.txt", "noext", ".jpg"] {
            assert!(!is_image(Path::new(name)), "{name}");
        }
    }

    #[tokio::test]
    async fn counts_and_collects_in_walk_order() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write(root, "b.jpg", "gps:2,20");
        write(root, "a.JPG", "gps:1,10");
        write(root, "sub/c.heic", "gps:3,30");
        write(root, "sub/nogps.tif", "plain");
        write(root, "notes.txt", "gps:9,9");

        let report = scan(root, &ScanConfig::default(), resolver()).await.unwrap();
        assert_eq!(
            report.counters,
            ScanCounters {
                total: 4,
                with_gps: 3,
                skipped: 1
            }
        );
        let names: Vec<_> = report.placemarks.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a.JPG", "b.jpg", "c.heic"]);
        let sub = &report.placemarks[2];
        assert_eq!(Path::new(&sub.desc), Path::new("sub").join("c.heic"));
        assert_eq!((sub.lat, sub.lon, sub.alt), (3.0, 30.0, None));
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn bad_files_are_skipped_with_a_warning() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write(root, "1.jpg", "gps:1,1");
        write(root, "2.jpg", "bad");
        write(root, "3.jpg", "panic");
        write(root, "4.jpg", "gps:4,4");

        let report = scan(root, &ScanConfig::default(), resolver()).await.unwrap();
        assert_eq!(report.counters.total, 4);
        assert_eq!(report.counters.with_gps, 2);
        assert_eq!(report.counters.skipped, 2);
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.warnings[0].path, root.join("2.jpg"));
        assert!(report.warnings[0].message.contains("corrupt IFD"));
        assert_eq!(report.warnings[1].path, root.join("3.jpg"));
    }

    #[tokio::test]
    async fn warnings_are_reported_as_they_arrive() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write(root, "1.jpg", "bad");
        write(root, "2.jpg", "gps:2,2");
        write(root, "3.jpg", "panic");

        let mut seen = Vec::new();
        let report = scan_with(root, &ScanConfig::default(), resolver(), |w| {
            seen.push(w.path.clone());
        })
        .await
        .unwrap();
        assert_eq!(seen, vec![root.join("1.jpg"), root.join("3.jpg")]);
        let collected: Vec<_> = report.warnings.iter().map(|w| w.path.clone()).collect();
        assert_eq!(seen, collected);
    }

    #[tokio::test]
    async fn excluded_directories_are_not_descended() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write(root, "keep.jpg", "gps:1,1");
        write(root, ".thumbnails/skip.jpg", "gps:2,2");
        write(root, "raw/skip.jpg", "gps:3,3");

        let cfg = ScanConfig {
            exclude: vec![".thumbnails".into(), "raw/*.jpg".into()],
            follow_links: false,
        };
        let report = scan(root, &cfg, resolver()).await.unwrap();
        assert_eq!(report.counters.total, 1);
        assert_eq!(report.placemarks[0].name, "keep.jpg");
    }

    #[tokio::test]
    async fn invalid_glob_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let cfg = ScanConfig {
            exclude: vec!["[".into()],
            follow_links: false,
        };
        assert!(scan(temp.path(), &cfg, resolver()).await.is_err());
    }

    #[tokio::test]
    async fn rescanning_is_deterministic() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        for i in 0..8 {
            write(root, &format!("d{}/img{}.jpg", i % 3, i), &format!("gps:{},{}", i, i * 2));
        }

        let first = scan(root, &ScanConfig::default(), resolver()).await.unwrap();
        let second = scan(root, &ScanConfig::default(), resolver()).await.unwrap();
        assert_eq!(first.placemarks, second.placemarks);
        assert_eq!(first.counters, second.counters);
    }
}
