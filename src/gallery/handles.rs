/// Registry of displayable, revocable image handles
///
/// A `ResourceHandle` is an opaque key; the registry owns the actual iced image
/// handle behind it. Revoking drops the pixel data and makes the key dead.
use std::collections::HashMap;

use iced::widget::image;
use parking_lot::Mutex;

/// Opaque reference to a registered image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(u64);

impl ResourceHandle {
    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        ResourceHandle(raw)
    }
}

#[derive(Default)]
struct RegistryInner {
    next: u64,
    live: HashMap<u64, image::Handle>,
    created: u64,
    revoked: u64,
}

#[derive(Default)]
pub struct HandleRegistry {
    inner: Mutex<RegistryInner>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register encoded image bytes and hand back a fresh key
    pub fn create(&self, bytes: Vec<u8>) -> ResourceHandle {
        let mut inner = self.inner.lock();
        inner.next += 1;
        let key = inner.next;
        inner.live.insert(key, image::Handle::from_bytes(bytes));
        inner.created += 1;
        ResourceHandle(key)
    }

    /// Drop the data behind `handle`
    ///
    /// Returns false when the handle was already revoked.
    pub fn revoke(&self, handle: ResourceHandle) -> bool {
        let mut inner = self.inner.lock();
        if inner.live.remove(&handle.0).is_some() {
            inner.revoked += 1;
            true
        } else {
            log::warn!("⚠️  Handle {:?} revoked twice", handle);
            false
        }
    }

    /// The displayable image behind a live handle
    pub fn get(&self, handle: ResourceHandle) -> Option<image::Handle> {
        self.inner.lock().live.get(&handle.0).cloned()
    }

    pub fn is_live(&self, handle: ResourceHandle) -> bool {
        self.inner.lock().live.contains_key(&handle.0)
    }

    pub fn live_count(&self) -> usize {
        self.inner.lock().live.len()
    }

    pub fn created_count(&self) -> u64 {
        self.inner.lock().created
    }

    pub fn revoked_count(&self) -> u64 {
        self.inner.lock().revoked
    }
}

impl std::fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("HandleRegistry")
            .field("live", &inner.live.len())
            .field("created", &inner.created)
            .field("revoked", &inner.revoked)
            .finish()
    }
}
