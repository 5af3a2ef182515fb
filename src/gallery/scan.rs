//! Recursive image discovery
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use icu_collator::{AlternateHandling, Collator, CollatorOptions};
use icu_locid::locale;

use super::item::{DiscoveredImage, SourceRef};
use crate::error::GalleryError;
use crate::loader::{EntryKind, FileAccessor};

/// Extensions the gallery displays, lower-case
pub const IMAGE_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".webp", ".gif", ".avif"];

pub fn is_image_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Locale-aware ordering for display paths (Chinese collation, pinyin for Han)
///
/// Punctuation keeps its primary weight, so "a.png" sorts before "A2.png".
/// The raw string breaks the rare collation ties so the order is total.
pub struct PathCollator {
    collator: Option<Collator>,
}

impl PathCollator {
    pub fn new() -> Self {
        let mut options = CollatorOptions::new();
        options.alternate_handling = Some(AlternateHandling::NonIgnorable);

        let collator = match Collator::try_new(&locale!("zh").into(), options) {
            Ok(collator) => Some(collator),
            Err(e) => {
                log::warn!("⚠️  Collation data unavailable, sorting by code point: {}", e);
                None
            }
        };
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let collated = match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => Ordering::Equal,
        };
        collated.then_with(|| a.cmp(b))
    }
}

impl Default for PathCollator {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_by_path(found: &mut [DiscoveredImage]) {
    let collator = PathCollator::new();
    found.sort_by(|a, b| collator.compare(&a.display_path, &b.display_path));
}

/// Find every supported image below `root`, sorted by display path
///
/// Failing to list the root is an error. Subdirectories that vanish or deny
/// access mid-scan are skipped.
pub async fn scan_directory(
    accessor: &dyn FileAccessor,
    root: &Path,
) -> Result<Vec<DiscoveredImage>, GalleryError> {
    let mut found = Vec::new();
    let mut pending: Vec<(PathBuf, String)> = vec![(root.to_path_buf(), String::new())];

    while let Some((dir, prefix)) = pending.pop() {
        let entries = match accessor.list_entries(&dir).await {
            Ok(entries) => entries,
            Err(e) if dir == root => return Err(GalleryError::read(e)),
            Err(e) => {
                log::warn!("⚠️  Skipping {}: {}", dir.display(), e);
                continue;
            }
        };

        for entry in entries {
            let relative = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", prefix, entry.name)
            };

            match entry.kind {
                EntryKind::Directory => pending.push((entry.path, relative)),
                EntryKind::File if is_image_file(&entry.name) => found.push(DiscoveredImage {
                    name: entry.name,
                    display_path: relative,
                    source: SourceRef {
                        path: entry.path,
                        parent: dir.clone(),
                    },
                }),
                EntryKind::File => {}
            }
        }
    }

    sort_by_path(&mut found);
    log::debug!("scan of {} found {} images", root.display(), found.len());
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::testing::{png_bytes, MemoryFs, ROOT};

    #[test]
    fn test_extension_filter() {
        assert!(is_image_file("photo.JPG"));
        assert!(is_image_file("anim.gif"));
        assert!(is_image_file("x.avif"));
        assert!(!is_image_file("notes.txt"));
        assert!(!is_image_file("png"));
    }

    #[test]
    fn test_collation() {
        let collator = PathCollator::new();
        assert_eq!(collator.compare("a.png", "A2.png"), Ordering::Less);
        assert_eq!(collator.compare("A2.png", "b.png"), Ordering::Less);
        assert_eq!(collator.compare("a.png", "A.png"), Ordering::Less);
        assert_eq!(collator.compare("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_collation_beyond_ascii() {
        let collator = PathCollator::new();
        // Accented letters sort with their base letter
        assert_eq!(collator.compare("é.png", "f.png"), Ordering::Less);
        assert_eq!(collator.compare("e.png", "é.png"), Ordering::Less);
        // Punctuation sorts before digits
        assert_eq!(collator.compare("a_1.png", "a1.png"), Ordering::Less);
        // Han characters follow pinyin: bei before shang, unlike code point order
        assert_eq!(collator.compare("北京.png", "上海.png"), Ordering::Less);
    }

    #[tokio::test]
    async fn test_scan_sorts_independent_of_enumeration() {
        let fs = MemoryFs::with_files(&[
            ("b.png", png_bytes(1, 1)),
            ("a.png", png_bytes(1, 1)),
            ("A2.png", png_bytes(1, 1)),
            ("readme.md", b"hi".to_vec()),
        ]);

        let found = scan_directory(fs.as_ref(), Path::new(ROOT)).await.unwrap();
        let paths: Vec<&str> = found.iter().map(|d| d.display_path.as_str()).collect();
        assert_eq!(paths, vec!["a.png", "A2.png", "b.png"]);
    }

    #[tokio::test]
    async fn test_scan_orders_non_ascii_names() {
        let fs = MemoryFs::with_files(&[
            ("上海.png", png_bytes(1, 1)),
            ("f.png", png_bytes(1, 1)),
            ("北京.png", png_bytes(1, 1)),
            ("é.png", png_bytes(1, 1)),
        ]);

        let found = scan_directory(fs.as_ref(), Path::new(ROOT)).await.unwrap();
        let paths: Vec<&str> = found.iter().map(|d| d.display_path.as_str()).collect();
        assert_eq!(paths, vec!["é.png", "f.png", "北京.png", "上海.png"]);
    }

    #[tokio::test]
    async fn test_scan_recurses_with_relative_paths() {
        let fs = MemoryFs::with_files(&[
            ("trip/day2/z.jpg", png_bytes(1, 1)),
            ("trip/a.webp", png_bytes(1, 1)),
            ("cover.png", png_bytes(1, 1)),
        ]);

        let found = scan_directory(fs.as_ref(), Path::new(ROOT)).await.unwrap();
        let paths: Vec<&str> = found.iter().map(|d| d.display_path.as_str()).collect();
        assert_eq!(paths, vec!["cover.png", "trip/a.webp", "trip/day2/z.jpg"]);

        let nested = &found[2];
        assert_eq!(nested.name, "z.jpg");
        assert_eq!(nested.source.parent, Path::new(ROOT).join("trip/day2"));
        assert_eq!(nested.source.path, Path::new(ROOT).join("trip/day2/z.jpg"));
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let fs = MemoryFs::with_files(&[]);
        let err = scan_directory(fs.as_ref(), Path::new("/elsewhere")).await.unwrap_err();
        assert!(matches!(err, GalleryError::NotFound(_)));
    }
}
