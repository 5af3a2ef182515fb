/// File side of deleting, saving and exporting
///
/// Nothing here touches the gallery until the file operation has succeeded.
/// `commit_save` is the only step that updates gallery state.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};

use super::edit::{render_edit, EditOps, Encoding, SaveFormat};
use crate::error::GalleryError;
use crate::gallery::handles::ResourceHandle;
use crate::gallery::item::{Dimensions, ItemId};
use crate::gallery::{Gallery, PendingDelete};
use crate::loader::FileAccessor;

/// An edit that has been written to disk
#[derive(Debug, Clone)]
pub struct SavedImage {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
}

/// Delete an item's file; the caller removes the item only on `Ok`
pub async fn delete_source(accessor: &dyn FileAccessor, pending: &PendingDelete) -> Result<(), GalleryError> {
    accessor
        .remove(&pending.parent, &pending.name)
        .await
        .map_err(GalleryError::write)?;
    log::info!("🗑️  Deleted {}", pending.parent.join(&pending.name).display());
    Ok(())
}

/// Read and decode the full image for editing
pub async fn load_source(accessor: &dyn FileAccessor, path: &Path) -> Result<Arc<DynamicImage>, GalleryError> {
    let file = accessor.read_bytes(path).await.map_err(GalleryError::read)?;
    tokio::task::spawn_blocking(move || {
        image::load_from_memory(&file.bytes)
            .map(Arc::new)
            .map_err(|e| GalleryError::Decode(e.to_string()))
    })
    .await
    .map_err(|e| GalleryError::Decode(e.to_string()))?
}

/// `path` with an extension matching `format`, kept as-is when it already matches
pub fn with_format_extension(path: &Path, format: SaveFormat) -> PathBuf {
    let matches = ImageFormat::from_path(path).map_or(false, |f| f == format.image_format());
    if matches {
        path.to_path_buf()
    } else {
        path.with_extension(format.extension())
    }
}

/// Render the edits from the file on disk and write the result to `target`
///
/// `target` may be the source itself (overwrite) or any other path (save as).
/// When a chosen format cannot be encoded the PNG fallback is written with a
/// `.png` extension instead.
pub async fn save_edit(
    accessor: &dyn FileAccessor,
    source: &Path,
    target: &Path,
    ops: EditOps,
    encoding: Encoding,
) -> Result<SavedImage, GalleryError> {
    let file = accessor.read_bytes(source).await.map_err(GalleryError::read)?;
    let destination = target.to_path_buf();
    let rendered = tokio::task::spawn_blocking(move || render_edit(&file.bytes, &ops, &destination, encoding))
        .await
        .map_err(|e| GalleryError::Write(e.to_string()))??;

    let path = match encoding {
        Encoding::Chosen { format, .. } if rendered.format != format.image_format() => target.with_extension("png"),
        _ => target.to_path_buf(),
    };
    let dimensions = Dimensions::new(rendered.width, rendered.height)
        .ok_or_else(|| GalleryError::Write("edit produced an empty image".to_string()))?;

    accessor
        .write(&path, rendered.bytes.clone())
        .await
        .map_err(GalleryError::write)?;
    log::info!(
        "💾 Saved {}×{} {:?} to {}",
        dimensions.width,
        dimensions.height,
        rendered.format,
        path.display()
    );

    Ok(SavedImage {
        path,
        bytes: rendered.bytes,
        dimensions,
    })
}

/// Copy the original file, unmodified, to `target`
pub async fn export_copy(accessor: &dyn FileAccessor, source: &Path, target: &Path) -> Result<u64, GalleryError> {
    let file = accessor.read_bytes(source).await.map_err(GalleryError::read)?;
    let size = file.size;
    accessor.write(target, file.bytes).await.map_err(GalleryError::write)?;
    log::info!("📤 Exported {} to {}", source.display(), target.display());
    Ok(size)
}

/// Reflect a finished save in the gallery
///
/// Only a save over the item's own file replaces its resource. Returns the
/// new handle in that case, `None` for a save to another path.
pub fn commit_save(
    gallery: &mut Gallery,
    id: ItemId,
    saved: SavedImage,
) -> Result<Option<ResourceHandle>, GalleryError> {
    let source = gallery.source_path(id).ok_or(GalleryError::Stale)?;
    if source != saved.path {
        return Ok(None);
    }
    gallery
        .replace_resource(id, saved.bytes, saved.dimensions)
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::testing::{loaded, png_bytes, MemoryFs, ROOT};
    use crate::state::edit::{Rotation, DEFAULT_QUALITY};

    const NAMES: [&str; 3] = ["a.png", "b.png", "c.png"];

    fn at_root(name: &str) -> PathBuf {
        Path::new(ROOT).join(name)
    }

    fn rotated() -> EditOps {
        EditOps {
            rotation: Rotation::Cw90,
            ..EditOps::default()
        }
    }

    #[tokio::test]
    async fn test_denied_delete_leaves_gallery_untouched() {
        let (fs, gallery) = loaded(&NAMES).await;
        let before = gallery.summary(1).unwrap();
        let pending = gallery.pending_delete(1).unwrap();
        fs.deny_writes();

        let err = delete_source(fs.as_ref(), &pending).await.unwrap_err();
        assert!(matches!(err, GalleryError::Write(_)));
        assert!(fs.exists("b.png"));
        assert_eq!(gallery.len(), NAMES.len());
        assert_eq!(gallery.summary(1).unwrap(), before);
        assert!(gallery.registry().is_live(before.handle.unwrap()));
        assert_eq!(gallery.surface().child_count(), NAMES.len());
    }

    #[tokio::test]
    async fn test_delete_then_remove() {
        let (fs, mut gallery) = loaded(&NAMES).await;
        let pending = gallery.pending_delete(0).unwrap();
        let handle = gallery.summary(0).unwrap().handle.unwrap();

        delete_source(fs.as_ref(), &pending).await.unwrap();
        assert!(!fs.exists("a.png"));

        let removal = gallery.remove_item(pending.id).unwrap();
        assert_eq!(removal.remaining, 2);
        assert!(!gallery.registry().is_live(handle));
    }

    #[tokio::test]
    async fn test_delete_of_vanished_file_is_not_found() {
        let (fs, gallery) = loaded(&NAMES).await;
        let pending = gallery.pending_delete(2).unwrap();
        fs.delete("c.png");

        let err = delete_source(fs.as_ref(), &pending).await.unwrap_err();
        assert!(matches!(err, GalleryError::NotFound(_)));
        assert_eq!(gallery.len(), NAMES.len());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_file_and_resource() {
        let (fs, mut gallery) = loaded(&NAMES).await;
        let id = gallery.item_id(0).unwrap();
        let old = gallery.summary(0).unwrap().handle.unwrap();
        let path = at_root("a.png");

        let saved = save_edit(fs.as_ref(), &path, &path, rotated(), Encoding::MatchPath)
            .await
            .unwrap();
        assert_eq!(fs.contents("a.png").unwrap(), saved.bytes);
        let decoded = image::load_from_memory(&saved.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 4));

        let handle = commit_save(&mut gallery, id, saved).unwrap().unwrap();
        assert!(!gallery.registry().is_live(old));
        let summary = gallery.summary(0).unwrap();
        assert_eq!(summary.handle, Some(handle));
        assert_eq!(summary.dimensions, Dimensions::new(2, 4));
    }

    #[tokio::test]
    async fn test_denied_overwrite_keeps_original() {
        let (fs, gallery) = loaded(&NAMES).await;
        let before = gallery.summary(0).unwrap();
        let original = fs.contents("a.png").unwrap();
        let path = at_root("a.png");
        fs.deny_writes();

        let err = save_edit(fs.as_ref(), &path, &path, rotated(), Encoding::MatchPath)
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::Write(_)));
        assert_eq!(fs.contents("a.png").unwrap(), original);
        assert_eq!(gallery.summary(0).unwrap(), before);
        assert!(gallery.registry().is_live(before.handle.unwrap()));
    }

    #[tokio::test]
    async fn test_overwrite_of_garbage_writes_nothing() {
        let fs = MemoryFs::with_files(&[("bad.png", b"not an image".to_vec())]);
        let path = at_root("bad.png");

        let err = save_edit(fs.as_ref(), &path, &path, rotated(), Encoding::MatchPath)
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::Decode(_)));
        assert_eq!(fs.contents("bad.png").unwrap(), b"not an image".to_vec());
    }

    #[tokio::test]
    async fn test_save_as_writes_new_file_only() {
        let (fs, mut gallery) = loaded(&NAMES).await;
        let id = gallery.item_id(0).unwrap();
        let before = gallery.summary(0).unwrap();
        let original = fs.contents("a.png").unwrap();

        let target = with_format_extension(&at_root("a-edit"), SaveFormat::Jpeg);
        let encoding = Encoding::Chosen {
            format: SaveFormat::Jpeg,
            quality: DEFAULT_QUALITY,
        };
        let saved = save_edit(fs.as_ref(), &at_root("a.png"), &target, rotated(), encoding)
            .await
            .unwrap();

        assert_eq!(saved.path, at_root("a-edit.jpg"));
        let written = fs.contents("a-edit.jpg").unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), ImageFormat::Jpeg);
        assert_eq!(fs.contents("a.png").unwrap(), original);

        assert_eq!(commit_save(&mut gallery, id, saved).unwrap(), None);
        assert_eq!(gallery.summary(0).unwrap(), before);
    }

    #[tokio::test]
    async fn test_commit_after_removal_is_stale() {
        let (fs, mut gallery) = loaded(&NAMES).await;
        let id = gallery.item_id(0).unwrap();
        let path = at_root("a.png");
        let saved = save_edit(fs.as_ref(), &path, &path, rotated(), Encoding::MatchPath)
            .await
            .unwrap();

        gallery.remove_item(id);
        assert_eq!(commit_save(&mut gallery, id, saved).unwrap_err(), GalleryError::Stale);
    }

    #[tokio::test]
    async fn test_export_copies_original_bytes() {
        let fs = MemoryFs::with_files(&[("a.png", png_bytes(3, 3))]);

        let size = export_copy(fs.as_ref(), &at_root("a.png"), &at_root("copy.png"))
            .await
            .unwrap();
        assert_eq!(fs.contents("copy.png"), fs.contents("a.png"));
        assert_eq!(size, fs.contents("a.png").unwrap().len() as u64);

        fs.deny_writes();
        let err = export_copy(fs.as_ref(), &at_root("a.png"), &at_root("again.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::Write(_)));
        assert!(!fs.exists("again.png"));
    }

    #[tokio::test]
    async fn test_load_source_decodes_full_image() {
        let fs = MemoryFs::with_files(&[("a.png", png_bytes(5, 3))]);
        let img = load_source(fs.as_ref(), &at_root("a.png")).await.unwrap();
        assert_eq!((img.width(), img.height()), (5, 3));

        let err = load_source(fs.as_ref(), &at_root("gone.png")).await.unwrap_err();
        assert!(matches!(err, GalleryError::NotFound(_)));
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(with_format_extension(Path::new("x.JPEG"), SaveFormat::Jpeg), PathBuf::from("x.JPEG"));
        assert_eq!(with_format_extension(Path::new("x.png"), SaveFormat::Webp), PathBuf::from("x.webp"));
        assert_eq!(with_format_extension(Path::new("x"), SaveFormat::Bmp), PathBuf::from("x.bmp"));
    }
}
