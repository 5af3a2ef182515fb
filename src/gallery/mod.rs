/// Gallery core
///
/// `Gallery` is the single owner of the collection and of everything that has
/// to stay consistent with it: placeholders, visibility watches, resource
/// handles and the pending layout pass. The UI only talks to this type.
pub mod collection;
pub mod handles;
pub mod item;
pub mod layout;
pub mod resources;
pub mod scan;
pub mod scheduler;
pub mod surface;
pub mod visibility;

#[cfg(test)]
pub mod testing;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use collection::{Collection, SharedCollection};
use handles::{HandleRegistry, ResourceHandle};
use item::{Dimensions, DiscoveredImage, FetchState, Item, ItemId};
use layout::{LayoutMode, LayoutParams, Rect};
use resources::ResourceManager;
use scheduler::LayoutScheduler;
use surface::{PlaceholderId, Surface};
use visibility::{LoadJob, VisibilityMode, VisibilityScheduler};

use crate::error::GalleryError;
use crate::loader::FileAccessor;

/// Read-only view of one item for the viewer and the grid
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSummary {
    pub id: ItemId,
    pub index: usize,
    pub name: String,
    pub display_path: String,
    pub dimensions: Option<Dimensions>,
    pub file_size: Option<u64>,
    pub mime: Option<String>,
    pub handle: Option<ResourceHandle>,
    pub fetch_state: FetchState,
}

/// Outcome of a single-item removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    pub id: ItemId,
    pub index: usize,
    pub remaining: usize,
}

/// What the file accessor needs to delete an item's file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub id: ItemId,
    pub parent: PathBuf,
    pub name: String,
}

#[derive(Debug)]
pub struct Gallery {
    collection: SharedCollection,
    resources: ResourceManager,
    surface: Surface,
    visibility: VisibilityScheduler,
    scheduler: LayoutScheduler,
    mode: LayoutMode,
    params: LayoutParams,
    container_width: f32,
    viewport: Rect,
    root: Option<PathBuf>,
}

impl Gallery {
    pub fn new(accessor: Arc<dyn FileAccessor>, visibility: VisibilityMode) -> Self {
        let collection = Collection::shared();
        let resources = ResourceManager::new(collection.clone(), accessor, Arc::new(HandleRegistry::new()));

        Self {
            collection,
            resources,
            surface: Surface::new(),
            visibility: VisibilityScheduler::new(visibility),
            scheduler: LayoutScheduler::new(),
            mode: LayoutMode::default(),
            params: LayoutParams::default(),
            container_width: 0.0,
            viewport: Rect::default(),
            root: None,
        }
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn registry(&self) -> &Arc<HandleRegistry> {
        self.resources.registry()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub fn params(&self) -> LayoutParams {
        self.params
    }

    pub fn len(&self) -> usize {
        self.collection.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.lock().is_empty()
    }

    pub fn item_id(&self, index: usize) -> Option<ItemId> {
        self.collection.lock().get(index).map(Item::id)
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.collection.lock().index_of(id)
    }

    pub fn summary(&self, index: usize) -> Option<ItemSummary> {
        let collection = self.collection.lock();
        let item = collection.get(index)?;
        Some(ItemSummary {
            id: item.id(),
            index,
            name: item.name().to_string(),
            display_path: item.display_path().to_string(),
            dimensions: item.dimensions(),
            file_size: item.file_size(),
            mime: item.mime().map(str::to_string),
            handle: item.handle(),
            fetch_state: item.fetch_state(),
        })
    }

    /// Load work for the item at `index`, used by the viewer to fetch on demand
    pub fn job_for(&self, index: usize) -> Option<LoadJob> {
        let collection = self.collection.lock();
        let item = collection.get(index)?;
        Some(LoadJob {
            placeholder: item.placeholder()?,
            item: item.id(),
        })
    }

    /// Swap in a freshly scanned directory
    ///
    /// Every resource of the outgoing collection is released first. A single
    /// layout pass is requested once all placeholders exist. Returns the loads
    /// that should start right away (only in eager mode).
    pub fn replace_all(&mut self, root: PathBuf, discovered: Vec<DiscoveredImage>) -> Vec<LoadJob> {
        let outgoing = self.collection.lock().take_all();
        let released = outgoing.len();
        for mut item in outgoing {
            self.resources.release(&mut item);
        }
        self.visibility.reset_all();
        self.surface.clear();

        let mut eager = Vec::new();
        {
            let mut collection = self.collection.lock();
            for (index, found) in discovered.into_iter().enumerate() {
                let mut item = Item::new(found);
                let placeholder = self.surface.create(item.id(), index);
                item.set_placeholder(Some(placeholder));
                eager.extend(self.visibility.watch(placeholder, item.id()));
                collection.push(item);
            }
        }

        log::info!(
            "📁 Loaded {} images from {} (released {})",
            self.len(),
            root.display(),
            released
        );
        self.root = Some(root);
        self.scheduler.request();
        eager
    }

    /// Remove the item at `index` and everything that refers to it
    ///
    /// Trailing placeholders are renumbered under the same lock as the splice.
    pub fn remove_at(&mut self, index: usize) -> Option<Removal> {
        let (mut item, remaining) = {
            let mut collection = self.collection.lock();
            let item = collection.remove(index)?;
            for (i, trailing) in collection.iter().enumerate().skip(index) {
                if let Some(placeholder) = trailing.placeholder() {
                    self.surface.set_index(placeholder, i);
                }
            }
            (item, collection.len())
        };

        if let Some(placeholder) = item.placeholder() {
            self.visibility.unwatch(placeholder);
            self.surface.remove(placeholder);
        }
        item.set_placeholder(None);
        self.resources.release(&mut item);

        if remaining == 0 {
            // Explicit empty state
            self.surface.clear();
            self.visibility.reset_all();
        }
        self.scheduler.request();

        log::debug!("removed {} ({} left)", item.display_path(), remaining);
        Some(Removal {
            id: item.id(),
            index,
            remaining,
        })
    }

    pub fn remove_item(&mut self, id: ItemId) -> Option<Removal> {
        let index = self.index_of(id)?;
        self.remove_at(index)
    }

    pub fn pending_delete(&self, index: usize) -> Option<PendingDelete> {
        let collection = self.collection.lock();
        let item = collection.get(index)?;
        Some(PendingDelete {
            id: item.id(),
            parent: item.source().parent.clone(),
            name: item.name().to_string(),
        })
    }

    /// Source path of a live item, for the editor's save-back
    pub fn source_path(&self, id: ItemId) -> Option<PathBuf> {
        self.collection.lock().by_id(id).map(|item| item.source().path.clone())
    }

    fn is_live(&self, job: LoadJob) -> bool {
        self.surface.item_for(job.placeholder) == Some(job.item) && self.collection.lock().contains(job.item)
    }

    /// Metadata resolved for a tile; returns the job again when its pixels should load next
    pub fn on_metadata(&mut self, job: LoadJob, result: &Result<Dimensions, GalleryError>) -> Option<LoadJob> {
        if !self.is_live(job) {
            return None;
        }
        match result {
            Ok(_) => {
                // Geometry depends on the ratio that just arrived
                self.scheduler.request();
                Some(job)
            }
            Err(e) if e.is_stale() => None,
            Err(_) => {
                self.visibility.rewatch(job.placeholder, job.item);
                None
            }
        }
    }

    /// Pixels resolved for a tile; swaps the placeholder source if it is still current
    pub fn on_resource(&mut self, job: LoadJob, result: &Result<ResourceHandle, GalleryError>) -> bool {
        if !self.is_live(job) {
            return false;
        }
        match result {
            Ok(handle) if self.registry().is_live(*handle) => {
                self.surface.set_source(job.placeholder, job.item, *handle)
            }
            Ok(_) => false,
            Err(e) if e.is_stale() => false,
            Err(_) => {
                self.visibility.rewatch(job.placeholder, job.item);
                false
            }
        }
    }

    /// New content was written over the item's file
    pub fn replace_resource(
        &mut self,
        id: ItemId,
        bytes: Vec<u8>,
        dims: Dimensions,
    ) -> Result<ResourceHandle, GalleryError> {
        let handle = self.resources.replace_resource(id, bytes, dims)?;
        let placeholder = self.collection.lock().by_id(id).and_then(Item::placeholder);
        if let Some(placeholder) = placeholder {
            self.surface.set_source(placeholder, id, handle);
        }
        self.scheduler.request();
        Ok(handle)
    }

    pub fn set_container_width(&mut self, width: f32) {
        if width != self.container_width {
            self.container_width = width;
            self.scheduler.request();
        }
    }

    /// The scroll viewport moved; returns tiles that came into range
    pub fn set_viewport(&mut self, viewport: Rect) -> Vec<LoadJob> {
        self.viewport = viewport;
        self.visibility.poll(self.viewport, &self.surface)
    }

    pub fn set_mode(&mut self, mode: LayoutMode) {
        if mode != self.mode {
            self.mode = mode;
            self.scheduler.request();
        }
    }

    pub fn set_params(&mut self, params: LayoutParams) {
        if params != self.params {
            self.params = params;
            self.scheduler.request();
        }
    }

    pub fn layout_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn layout_passes(&self) -> usize {
        self.scheduler.passes()
    }

    /// Animation frame tick: runs the pending layout pass, if any
    pub fn on_frame(&mut self) -> Vec<LoadJob> {
        if self.scheduler.take_frame() {
            self.run_layout()
        } else {
            Vec::new()
        }
    }

    fn run_layout(&mut self) -> Vec<LoadJob> {
        // Collection state as of this frame
        let (ratios, order): (Vec<Option<f32>>, Vec<PlaceholderId>) = {
            let collection = self.collection.lock();
            collection
                .iter()
                .filter_map(|item| item.placeholder().map(|p| (item.aspect_ratio(), p)))
                .unzip()
        };

        if let Some(placement) = layout::compute(&ratios, self.container_width, self.mode, &self.params) {
            self.surface.apply(&placement, &order);
        }
        self.visibility.poll(self.viewport, &self.surface)
    }

    #[cfg(test)]
    fn watched_count(&self) -> usize {
        self.visibility.watched_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::surface::Source;
    use crate::gallery::testing::{discovered, drive, gallery_with, loaded, png_bytes, MemoryFs, ROOT};

    const NAMES: [&str; 4] = ["a.png", "b.png", "c.png", "d.png"];

    #[tokio::test]
    async fn test_bulk_load_runs_one_layout_pass() {
        let names: Vec<String> = (0..50).map(|i| format!("{:02}.png", i)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let (_fs, mut gallery) = gallery_with(&names, VisibilityMode::default());

        assert!(gallery.layout_pending());
        gallery.on_frame();
        assert!(gallery.on_frame().is_empty());
        assert_eq!(gallery.layout_passes(), 1);
        assert_eq!(gallery.surface().child_count(), 50);
    }

    #[tokio::test]
    async fn test_tiles_show_loaded_handles() {
        let (fs, gallery) = loaded(&NAMES).await;
        // One read per file covers both the metadata and the pixels
        assert_eq!(fs.reads(), NAMES.len());

        for index in 0..NAMES.len() {
            let summary = gallery.summary(index).unwrap();
            assert_eq!(summary.fetch_state, FetchState::ResourceReady);
            let placeholder = gallery.job_for(index).unwrap().placeholder;
            let tile = gallery.surface().get(placeholder).unwrap();
            assert_eq!(tile.source, Source::Loaded(summary.handle.unwrap()));
        }
        assert_eq!(gallery.watched_count(), 0);
    }

    #[tokio::test]
    async fn test_metadata_arrival_requests_layout() {
        let (_fs, mut gallery) = gallery_with(&["a.png"], VisibilityMode::default());
        let jobs = gallery.on_frame();
        assert!(!gallery.layout_pending());

        let placeholder = jobs[0].placeholder;
        // Square until the 2:1 ratio is known
        let before = gallery.surface().get(placeholder).unwrap().rect;
        assert_eq!(before.width, before.height);

        drive(&mut gallery, jobs).await;
        assert!(gallery.layout_pending());
        gallery.on_frame();
        let after = gallery.surface().get(placeholder).unwrap().rect;
        assert!((after.width / after.height - 2.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_remove_renumbers_and_revokes_once() {
        let (_fs, mut gallery) = loaded(&NAMES).await;
        let trailing: Vec<PlaceholderId> = (2..4).map(|i| gallery.job_for(i).unwrap().placeholder).collect();

        let removal = gallery.remove_at(1).unwrap();
        assert_eq!(removal.index, 1);
        assert_eq!(removal.remaining, 3);
        assert!(gallery.index_of(removal.id).is_none());

        for (offset, placeholder) in trailing.iter().enumerate() {
            assert_eq!(gallery.surface().get(*placeholder).unwrap().index, 1 + offset);
        }
        assert_eq!(gallery.summary(1).unwrap().name, "c.png");
        assert_eq!(gallery.registry().revoked_count(), 1);

        // Removing everything else revokes each remaining handle exactly once
        while gallery.remove_at(0).is_some() {}
        assert_eq!(gallery.registry().revoked_count(), 4);
        assert_eq!(gallery.registry().live_count(), 0);
    }

    #[tokio::test]
    async fn test_removing_last_item_enters_empty_state() {
        let (_fs, mut gallery) = gallery_with(&["only.png"], VisibilityMode::default());
        // No frame yet, so the tile is still watched
        assert_eq!(gallery.watched_count(), 1);

        let removal = gallery.remove_at(0).unwrap();
        assert_eq!(removal.remaining, 0);
        assert!(gallery.is_empty());
        assert!(gallery.surface().is_empty());
        assert_eq!(gallery.surface().child_count(), 0);
        assert_eq!(gallery.watched_count(), 0);
        assert!(gallery.remove_at(0).is_none());
    }

    #[tokio::test]
    async fn test_replace_all_releases_every_handle() {
        let (_fs, mut gallery) = loaded(&NAMES).await;
        assert_eq!(gallery.registry().live_count(), 4);

        gallery.replace_all(PathBuf::from(ROOT), vec![discovered("x.png"), discovered("y.png")]);
        assert_eq!(gallery.registry().live_count(), 0);
        assert_eq!(gallery.registry().revoked_count(), 4);
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.surface().len(), 2);
        assert_eq!(gallery.watched_count(), 2);
    }

    #[tokio::test]
    async fn test_stale_load_is_not_applied() {
        let (fs, mut gallery) = gallery_with(&NAMES, VisibilityMode::default());
        let jobs = gallery.on_frame();
        let job = jobs[0];

        let gate = fs.hold_next_read();
        let resources = gallery.resources().clone();
        let mut load = Box::pin(resources.ensure_resource(job.item));
        assert!(futures::poll!(&mut load).is_pending());

        gallery.remove_at(0).unwrap();
        gate.send(()).unwrap();
        let result = load.await;

        assert_eq!(result, Err(GalleryError::Stale));
        assert!(!gallery.on_resource(job, &result));
        assert_eq!(gallery.registry().live_count(), 0);
        assert!(gallery.surface().get(job.placeholder).is_none());
    }

    #[tokio::test]
    async fn test_failed_load_is_watched_again() {
        let (fs, mut gallery) = gallery_with(&["a.png"], VisibilityMode::default());
        fs.delete("a.png");
        let jobs = gallery.on_frame();
        drive(&mut gallery, jobs).await;

        assert_eq!(gallery.summary(0).unwrap().fetch_state, FetchState::Failed);
        assert_eq!(gallery.watched_count(), 1);

        // Leave the preload region and come back
        fs.insert("a.png", png_bytes(4, 2));
        assert!(gallery.set_viewport(Rect::new(0.0, 9000.0, 1000.0, 800.0)).is_empty());
        let jobs = gallery.set_viewport(Rect::new(0.0, 0.0, 1000.0, 800.0));
        assert_eq!(jobs.len(), 1);
        drive(&mut gallery, jobs).await;
        assert_eq!(gallery.summary(0).unwrap().fetch_state, FetchState::ResourceReady);
    }

    #[tokio::test]
    async fn test_eager_mode_loads_everything() {
        let fs = MemoryFs::with_files(&[("a.png", png_bytes(1, 1))]);
        let mut gallery = Gallery::new(fs.clone(), VisibilityMode::Eager);
        let jobs = gallery.replace_all(PathBuf::from(ROOT), vec![discovered("a.png"), discovered("b.png")]);
        assert_eq!(jobs.len(), 2);
    }

    #[tokio::test]
    async fn test_replace_resource_repoints_tile() {
        let (_fs, mut gallery) = loaded(&["a.png"]).await;
        let old = gallery.summary(0).unwrap().handle.unwrap();
        let id = gallery.item_id(0).unwrap();

        let handle = gallery
            .replace_resource(id, png_bytes(2, 4), Dimensions::new(2, 4).unwrap())
            .unwrap();
        assert!(!gallery.registry().is_live(old));

        let placeholder = gallery.job_for(0).unwrap().placeholder;
        assert_eq!(gallery.surface().get(placeholder).unwrap().source, Source::Loaded(handle));
        assert!(gallery.layout_pending());
    }

    #[tokio::test]
    async fn test_row_resize_keeps_structure() {
        let (_fs, mut gallery) = loaded(&NAMES).await;
        gallery.set_mode(LayoutMode::Horizontal);
        gallery.on_frame();
        let rebuilds = gallery.surface().rebuild_count();

        for width in [800.0, 640.0, 1200.0] {
            gallery.set_container_width(width);
            gallery.on_frame();
        }
        assert_eq!(gallery.surface().rebuild_count(), rebuilds);
    }
}
