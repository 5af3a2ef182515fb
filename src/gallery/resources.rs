/// Resource lifecycle manager
///
/// Coordinates on-demand reads, dimension probing and handle creation per item.
/// Every in-flight operation is memoized on the item as a shared future so that
/// repeated requests join the same I/O instead of starting a new one.
///
/// Commit steps run inside the shared future, exactly once per load, and
/// re-validate that the item is still live before writing. A load that resolves
/// for a removed or released item revokes its own handle and reports `Stale`.
///
/// The file itself is read once per load cycle: dimension lookup and the
/// resource load join the same memoized read, which is dropped once the
/// resource commits (or anything fails).
use std::sync::Arc;

use futures::FutureExt;

use super::collection::SharedCollection;
use super::handles::{HandleRegistry, ResourceHandle};
use super::item::{Dimensions, FileFuture, Item, ItemId, MetadataFuture, ResourceFuture};
use crate::error::GalleryError;
use crate::loader::{probe_dimensions, FileAccessor, FileBytes};

#[derive(Clone)]
pub struct ResourceManager {
    collection: SharedCollection,
    accessor: Arc<dyn FileAccessor>,
    registry: Arc<HandleRegistry>,
}

impl ResourceManager {
    pub fn new(
        collection: SharedCollection,
        accessor: Arc<dyn FileAccessor>,
        registry: Arc<HandleRegistry>,
    ) -> Self {
        Self {
            collection,
            accessor,
            registry,
        }
    }

    pub fn accessor(&self) -> &Arc<dyn FileAccessor> {
        &self.accessor
    }

    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    /// Resolve the item's pixel dimensions, probing the file at most once at a time
    pub async fn ensure_metadata(&self, id: ItemId) -> Result<Dimensions, GalleryError> {
        let pending = {
            let mut collection = self.collection.lock();
            let item = collection.by_id_mut(id).ok_or(GalleryError::Stale)?;

            if let Some(dims) = item.dimensions() {
                return Ok(dims);
            }

            match &item.metadata_inflight {
                Some(pending) => pending.clone(),
                None => {
                    let file = self.file_for(item);
                    let pending = self.start_metadata(id, item.epoch, file);
                    item.metadata_inflight = Some(pending.clone());
                    item.refresh_state(false);
                    pending
                }
            }
        };

        pending.await
    }

    /// Resolve a displayable handle for the item, reading the file at most once at a time
    pub async fn ensure_resource(&self, id: ItemId) -> Result<ResourceHandle, GalleryError> {
        let pending = {
            let mut collection = self.collection.lock();
            let item = collection.by_id_mut(id).ok_or(GalleryError::Stale)?;

            if let Some(handle) = item.handle() {
                return Ok(handle);
            }

            match &item.resource_inflight {
                Some(pending) => pending.clone(),
                None => {
                    let file = self.file_for(item);
                    let pending = self.start_resource(id, item.epoch, file);
                    item.resource_inflight = Some(pending.clone());
                    item.refresh_state(false);
                    pending
                }
            }
        };

        pending.await
    }

    /// Revoke the item's handle and forget all memoized work
    ///
    /// Safe to call any number of times on the same item.
    pub fn release(&self, item: &mut Item) {
        if let Some(handle) = item.take_handle() {
            self.registry.revoke(handle);
        }
        item.metadata_inflight = None;
        item.resource_inflight = None;
        item.file_inflight = None;
        item.epoch += 1;
        item.refresh_state(false);
    }

    /// Swap in new content for a live item after its file was overwritten
    ///
    /// The old handle is revoked before the new one is stored.
    pub fn replace_resource(
        &self,
        id: ItemId,
        bytes: Vec<u8>,
        dims: Dimensions,
    ) -> Result<ResourceHandle, GalleryError> {
        let mut collection = self.collection.lock();
        let item = collection.by_id_mut(id).ok_or(GalleryError::Stale)?;

        let size = bytes.len() as u64;
        let handle = self.registry.create(bytes);
        if let Some(old) = item.take_handle() {
            self.registry.revoke(old);
        }
        item.set_handle(handle);
        item.file_inflight = None;
        item.replace_dimensions(dims);
        item.set_file_info(size, None);
        item.refresh_state(false);

        Ok(handle)
    }

    /// Join the item's outstanding read or start one
    fn file_for(&self, item: &mut Item) -> FileFuture {
        if let Some(file) = &item.file_inflight {
            return file.clone();
        }

        let accessor = self.accessor.clone();
        let path = item.source().path.clone();
        let file = async move {
            accessor
                .read_bytes(&path)
                .await
                .map(Arc::new)
                .map_err(GalleryError::read)
        }
        .boxed()
        .shared();
        item.file_inflight = Some(file.clone());
        file
    }

    fn start_metadata(&self, id: ItemId, epoch: u64, file: FileFuture) -> MetadataFuture {
        let manager = self.clone();
        async move {
            let result = match file.await {
                Ok(file) => probe_dimensions(file).await,
                Err(e) => Err(e),
            };
            manager.commit_metadata(id, epoch, result)
        }
        .boxed()
        .shared()
    }

    fn commit_metadata(
        &self,
        id: ItemId,
        epoch: u64,
        result: Result<Dimensions, GalleryError>,
    ) -> Result<Dimensions, GalleryError> {
        let mut collection = self.collection.lock();
        let Some(item) = collection.by_id_mut(id).filter(|item| item.epoch == epoch) else {
            log::debug!("discarding metadata for released item {:?}", id);
            return Err(GalleryError::Stale);
        };

        item.metadata_inflight = None;
        match result {
            Ok(dims) => {
                // Keep the bytes for the resource load unless it already happened
                if item.handle().is_some() {
                    item.file_inflight = None;
                }
                item.set_dimensions(dims);
                item.refresh_state(false);
                Ok(item.dimensions().unwrap_or(dims))
            }
            Err(e) => {
                log::warn!("⚠️  Could not read image info for {}: {}", item.display_path(), e);
                item.file_inflight = None;
                item.refresh_state(true);
                Err(e)
            }
        }
    }

    fn start_resource(&self, id: ItemId, epoch: u64, file: FileFuture) -> ResourceFuture {
        let manager = self.clone();
        async move {
            match file.await {
                Ok(file) => {
                    let size = file.size;
                    let mime = file.mime.clone();
                    let handle = manager.registry.create(into_bytes(file));
                    manager.commit_resource(id, epoch, handle, size, mime)
                }
                Err(e) => manager.fail_resource(id, epoch, e),
            }
        }
        .boxed()
        .shared()
    }

    fn commit_resource(
        &self,
        id: ItemId,
        epoch: u64,
        handle: ResourceHandle,
        size: u64,
        mime: Option<String>,
    ) -> Result<ResourceHandle, GalleryError> {
        let mut collection = self.collection.lock();
        let Some(item) = collection.by_id_mut(id).filter(|item| item.epoch == epoch) else {
            // Nobody will ever own this handle
            self.registry.revoke(handle);
            log::debug!("discarding resource for released item {:?}", id);
            return Err(GalleryError::Stale);
        };

        item.resource_inflight = None;
        item.file_inflight = None;
        item.set_file_info(size, mime);

        if let Some(existing) = item.handle() {
            // Content was replaced while we were reading
            self.registry.revoke(handle);
            item.refresh_state(false);
            return Ok(existing);
        }

        item.set_handle(handle);
        item.refresh_state(false);
        Ok(handle)
    }

    fn fail_resource(
        &self,
        id: ItemId,
        epoch: u64,
        err: GalleryError,
    ) -> Result<ResourceHandle, GalleryError> {
        let mut collection = self.collection.lock();
        let Some(item) = collection.by_id_mut(id).filter(|item| item.epoch == epoch) else {
            return Err(GalleryError::Stale);
        };

        log::warn!("⚠️  Image load failed for {}: {}", item.display_path(), err);
        item.resource_inflight = None;
        item.file_inflight = None;
        item.refresh_state(true);
        Err(err)
    }
}

/// Take the bytes out of a shared read, copying only if someone else still holds them
fn into_bytes(file: Arc<FileBytes>) -> Vec<u8> {
    Arc::try_unwrap(file)
        .map(|file| file.bytes)
        .unwrap_or_else(|file| file.bytes.clone())
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("registry", &self.registry)
            .finish()
    }
}
