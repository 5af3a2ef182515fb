/// Visibility scheduler
///
/// Watches placeholders and hands them to the loader once they come within
/// `margin` pixels of the viewport. Each watch is one-shot. Without a usable
/// viewport signal every placeholder is loaded as soon as it is created.
use std::collections::HashMap;

use super::item::ItemId;
use super::layout::Rect;
use super::surface::{PlaceholderId, Surface};

/// How far outside the viewport tiles start loading
pub const PRELOAD_MARGIN: f32 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisibilityMode {
    Proximity { margin: f32 },
    /// Load everything immediately
    Eager,
}

impl Default for VisibilityMode {
    fn default() -> Self {
        VisibilityMode::Proximity {
            margin: PRELOAD_MARGIN,
        }
    }
}

/// Work handed to the resource manager for one tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadJob {
    pub placeholder: PlaceholderId,
    pub item: ItemId,
}

#[derive(Debug, Clone, Copy)]
struct Watch {
    item: ItemId,
    /// A re-watched tile must leave the preload region before it fires again
    armed: bool,
}

#[derive(Debug, Default)]
pub struct VisibilityScheduler {
    mode: VisibilityMode,
    watched: HashMap<PlaceholderId, Watch>,
}

impl VisibilityScheduler {
    pub fn new(mode: VisibilityMode) -> Self {
        Self {
            mode,
            watched: HashMap::new(),
        }
    }

    /// Start watching; in eager mode the job is returned right away instead
    pub fn watch(&mut self, placeholder: PlaceholderId, item: ItemId) -> Option<LoadJob> {
        match self.mode {
            VisibilityMode::Eager => Some(LoadJob { placeholder, item }),
            VisibilityMode::Proximity { .. } => {
                self.watched.insert(placeholder, Watch { item, armed: true });
                None
            }
        }
    }

    /// Watch again after a failed load
    pub fn rewatch(&mut self, placeholder: PlaceholderId, item: ItemId) {
        if let VisibilityMode::Proximity { .. } = self.mode {
            self.watched.insert(placeholder, Watch { item, armed: false });
        }
    }

    pub fn unwatch(&mut self, placeholder: PlaceholderId) {
        self.watched.remove(&placeholder);
    }

    pub fn reset_all(&mut self) {
        self.watched.clear();
    }

    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    pub fn is_watching(&self, placeholder: PlaceholderId) -> bool {
        self.watched.contains_key(&placeholder)
    }

    /// Fire every watched tile that is near `viewport`, in collection order
    pub fn poll(&mut self, viewport: Rect, surface: &Surface) -> Vec<LoadJob> {
        let VisibilityMode::Proximity { margin } = self.mode else {
            return Vec::new();
        };
        let region = viewport.expand(margin);

        let mut fired = Vec::new();
        self.watched.retain(|&placeholder, watch| {
            let Some(tile) = surface.get(placeholder) else {
                return false;
            };
            if !tile.placed {
                return true;
            }

            let near = tile.rect.intersects(&region);
            if !watch.armed {
                watch.armed = !near;
                return true;
            }
            if near {
                fired.push((tile.index, LoadJob { placeholder, item: watch.item }));
                return false;
            }
            true
        });

        fired.sort_by_key(|(index, _)| *index);
        fired.into_iter().map(|(_, job)| job).collect()
    }
}
