/// Ordered, index-addressable set of items
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::item::{Item, ItemId};

/// The collection shared between the UI thread and in-flight loads
pub type SharedCollection = Arc<Mutex<Collection>>;

#[derive(Debug, Default)]
pub struct Collection {
    items: Vec<Item>,
    index_of: HashMap<ItemId, usize>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedCollection {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn by_id(&self, id: ItemId) -> Option<&Item> {
        self.index_of.get(&id).map(|&i| &self.items[i])
    }

    pub fn by_id_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        let index = *self.index_of.get(&id)?;
        self.items.get_mut(index)
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.index_of.get(&id).copied()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index_of.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub(super) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Item> {
        self.items.iter_mut()
    }

    pub(super) fn push(&mut self, item: Item) -> usize {
        let index = self.items.len();
        self.index_of.insert(item.id(), index);
        self.items.push(item);
        index
    }

    /// Splice out the item at `index`, renumbering every trailing item
    pub(super) fn remove(&mut self, index: usize) -> Option<Item> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.index_of.remove(&item.id());
        for (i, trailing) in self.items.iter().enumerate().skip(index) {
            self.index_of.insert(trailing.id(), i);
        }
        Some(item)
    }

    /// Empty the collection, handing the old items to the caller for release
    pub(super) fn take_all(&mut self) -> Vec<Item> {
        self.index_of.clear();
        std::mem::take(&mut self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::testing::discovered;

    #[test]
    fn test_remove_renumbers() {
        let mut collection = Collection::new();
        let ids: Vec<ItemId> = ["a.png", "b.png", "c.png", "d.png"]
            .iter()
            .map(|name| {
                let item = Item::new(discovered(name));
                let id = item.id();
                collection.push(item);
                id
            })
            .collect();

        let removed = collection.remove(1).unwrap();
        assert_eq!(removed.id(), ids[1]);
        assert!(!collection.contains(ids[1]));
        assert_eq!(collection.index_of(ids[0]), Some(0));
        assert_eq!(collection.index_of(ids[2]), Some(1));
        assert_eq!(collection.index_of(ids[3]), Some(2));
        assert_eq!(collection.by_id(ids[3]).unwrap().name(), "d.png");
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut collection = Collection::new();
        assert!(collection.remove(0).is_none());
    }

    #[test]
    fn test_take_all_clears_lookup() {
        let mut collection = Collection::new();
        let item = Item::new(discovered("a.png"));
        let id = item.id();
        collection.push(item);

        let old = collection.take_all();
        assert_eq!(old.len(), 1);
        assert!(collection.is_empty());
        assert!(collection.by_id(id).is_none());
    }
}
