/// In-memory record for one discovered image
///
/// Items are owned by the `Collection`. Fetch-related fields are only written
/// by the `ResourceManager`; everything else in the crate reads them through
/// the getters below.
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};

use super::handles::ResourceHandle;
use super::surface::PlaceholderId;
use crate::error::GalleryError;
use crate::loader::FileBytes;

/// Memoized read of the item's file, shared by the metadata and resource loads
pub type FileFuture = Shared<BoxFuture<'static, Result<Arc<FileBytes>, GalleryError>>>;
/// Memoized in-flight metadata probe
pub type MetadataFuture = Shared<BoxFuture<'static, Result<Dimensions, GalleryError>>>;
/// Memoized in-flight resource load
pub type ResourceFuture = Shared<BoxFuture<'static, Result<ResourceHandle, GalleryError>>>;

static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an item, never reused within a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    fn next() -> Self {
        ItemId(NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Pixel dimensions, both strictly positive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Which memoized operation, if any, is outstanding for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Unstarted,
    MetadataPending,
    MetadataReady,
    ResourcePending,
    ResourceReady,
    Failed,
}

/// Where the image lives on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Full path of the file
    pub path: PathBuf,
    /// Directory that contains it
    pub parent: PathBuf,
}

/// A discovered image, before it becomes an `Item`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredImage {
    /// File name only (e.g. "IMG_0001.jpg")
    pub name: String,
    /// Path relative to the scanned root, '/'-separated
    pub display_path: String,
    pub source: SourceRef,
}

pub struct Item {
    id: ItemId,
    name: String,
    display_path: String,
    source: SourceRef,
    dimensions: Option<Dimensions>,
    handle: Option<ResourceHandle>,
    fetch_state: FetchState,
    file_size: Option<u64>,
    mime: Option<String>,
    placeholder: Option<PlaceholderId>,
    pub(super) metadata_inflight: Option<MetadataFuture>,
    pub(super) resource_inflight: Option<ResourceFuture>,
    /// Kept from the first read until the resource commits
    pub(super) file_inflight: Option<FileFuture>,
    /// Bumped on every release so late continuations can tell they are stale
    pub(super) epoch: u64,
}

impl std::fmt::Debug for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.id)
            .field("display_path", &self.display_path)
            .field("dimensions", &self.dimensions)
            .field("handle", &self.handle)
            .field("fetch_state", &self.fetch_state)
            .finish()
    }
}

impl Item {
    pub fn new(discovered: DiscoveredImage) -> Self {
        Self {
            id: ItemId::next(),
            name: discovered.name,
            display_path: discovered.display_path,
            source: discovered.source,
            dimensions: None,
            handle: None,
            fetch_state: FetchState::Unstarted,
            file_size: None,
            mime: None,
            placeholder: None,
            metadata_inflight: None,
            resource_inflight: None,
            file_inflight: None,
            epoch: 0,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_path(&self) -> &str {
        &self.display_path
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    /// Known only once both dimensions are known
    pub fn aspect_ratio(&self) -> Option<f32> {
        self.dimensions.map(|d| d.aspect_ratio())
    }

    pub fn handle(&self) -> Option<ResourceHandle> {
        self.handle
    }

    pub fn fetch_state(&self) -> FetchState {
        self.fetch_state
    }

    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    pub fn placeholder(&self) -> Option<PlaceholderId> {
        self.placeholder
    }

    pub(super) fn set_placeholder(&mut self, placeholder: Option<PlaceholderId>) {
        self.placeholder = placeholder;
    }

    /// Dimensions are write-once; returns false if they were already known
    pub(super) fn set_dimensions(&mut self, dims: Dimensions) -> bool {
        if self.dimensions.is_some() {
            return false;
        }
        self.dimensions = Some(dims);
        true
    }

    /// Only used when the underlying file content itself was replaced
    pub(super) fn replace_dimensions(&mut self, dims: Dimensions) {
        self.dimensions = Some(dims);
    }

    pub(super) fn set_handle(&mut self, handle: ResourceHandle) {
        self.handle = Some(handle);
    }

    pub(super) fn take_handle(&mut self) -> Option<ResourceHandle> {
        self.handle.take()
    }

    pub(super) fn set_file_info(&mut self, size: u64, mime: Option<String>) {
        self.file_size = Some(size);
        if mime.is_some() {
            self.mime = mime;
        }
    }

    /// Recompute `fetch_state` from the facts held by the item
    ///
    /// A live handle always wins so `handle.is_some()` implies `ResourceReady`.
    pub(super) fn refresh_state(&mut self, failed: bool) {
        self.fetch_state = if self.handle.is_some() {
            FetchState::ResourceReady
        } else if self.resource_inflight.is_some() {
            FetchState::ResourcePending
        } else if self.metadata_inflight.is_some() {
            FetchState::MetadataPending
        } else if failed {
            FetchState::Failed
        } else if self.dimensions.is_some() {
            FetchState::MetadataReady
        } else {
            FetchState::Unstarted
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::testing::discovered;

    #[test]
    fn test_ids_are_unique() {
        let a = Item::new(discovered("a.png"));
        let b = Item::new(discovered("a.png"));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(Dimensions::new(0, 10).is_none());
        assert!(Dimensions::new(10, 0).is_none());
        assert_eq!(Dimensions::new(20, 10).unwrap().aspect_ratio(), 2.0);
    }

    #[test]
    fn test_dimensions_write_once() {
        let mut item = Item::new(discovered("a.png"));
        assert!(item.aspect_ratio().is_none());
        assert!(item.set_dimensions(Dimensions::new(4, 2).unwrap()));
        assert!(!item.set_dimensions(Dimensions::new(1, 1).unwrap()));
        assert_eq!(item.aspect_ratio(), Some(2.0));
    }

    #[test]
    fn test_state_follows_facts() {
        let mut item = Item::new(discovered("a.png"));
        item.refresh_state(true);
        assert_eq!(item.fetch_state(), FetchState::Failed);

        item.set_dimensions(Dimensions::new(4, 2).unwrap());
        item.refresh_state(false);
        assert_eq!(item.fetch_state(), FetchState::MetadataReady);

        item.set_handle(ResourceHandle::from_raw(7));
        item.refresh_state(true);
        assert_eq!(item.fetch_state(), FetchState::ResourceReady);
    }
}
