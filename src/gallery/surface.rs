/// Placement surface: the placeholders the grid renders
///
/// Owns the placeholder → item side table. Structural changes (rebuilding the
/// column containers or the flat row flow) only happen when the strategy
/// changes or the child count diverges; otherwise a layout pass just rewrites
/// lane and geometry in place, so loaded tiles are never recreated on resize.
use std::collections::HashMap;

use super::handles::ResourceHandle;
use super::item::ItemId;
use super::layout::{LayoutMode, Placement, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderId(u64);

/// What the tile currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Blank,
    Loaded(ResourceHandle),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub id: PlaceholderId,
    pub item: ItemId,
    /// Position in the collection, used for click-to-open
    pub index: usize,
    pub lane: usize,
    pub rect: Rect,
    /// False until the first layout pass positions it
    pub placed: bool,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq)]
enum Structure {
    Empty,
    Columns(Vec<Vec<PlaceholderId>>),
    Flow(Vec<PlaceholderId>),
}

#[derive(Debug)]
pub struct Surface {
    placeholders: HashMap<PlaceholderId, Placeholder>,
    structure: Structure,
    next_id: u64,
    content_height: f32,
    rebuilds: usize,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            placeholders: HashMap::new(),
            structure: Structure::Empty,
            next_id: 0,
            content_height: 0.0,
            rebuilds: 0,
        }
    }
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a blank placeholder and mount it at the end of the first container
    pub fn create(&mut self, item: ItemId, index: usize) -> PlaceholderId {
        self.next_id += 1;
        let id = PlaceholderId(self.next_id);
        self.placeholders.insert(
            id,
            Placeholder {
                id,
                item,
                index,
                lane: 0,
                rect: Rect::default(),
                placed: false,
                source: Source::Blank,
            },
        );

        match &mut self.structure {
            Structure::Columns(columns) if !columns.is_empty() => columns[0].push(id),
            Structure::Flow(flow) => flow.push(id),
            _ => self.structure = Structure::Flow(vec![id]),
        }
        id
    }

    /// Detach a placeholder and drop its side-table entry
    pub fn remove(&mut self, id: PlaceholderId) -> Option<Placeholder> {
        let removed = self.placeholders.remove(&id)?;
        match &mut self.structure {
            Structure::Columns(columns) => {
                for column in columns.iter_mut() {
                    column.retain(|p| *p != id);
                }
            }
            Structure::Flow(flow) => flow.retain(|p| *p != id),
            Structure::Empty => {}
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.placeholders.clear();
        self.structure = Structure::Empty;
        self.content_height = 0.0;
    }

    pub fn get(&self, id: PlaceholderId) -> Option<&Placeholder> {
        self.placeholders.get(&id)
    }

    pub fn item_for(&self, id: PlaceholderId) -> Option<ItemId> {
        self.placeholders.get(&id).map(|p| p.item)
    }

    pub fn len(&self) -> usize {
        self.placeholders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placeholders.is_empty()
    }

    /// Number of placeholders currently mounted in the structure
    pub fn child_count(&self) -> usize {
        match &self.structure {
            Structure::Empty => 0,
            Structure::Columns(columns) => columns.iter().map(Vec::len).sum(),
            Structure::Flow(flow) => flow.len(),
        }
    }

    pub fn set_index(&mut self, id: PlaceholderId, index: usize) {
        if let Some(placeholder) = self.placeholders.get_mut(&id) {
            placeholder.index = index;
        }
    }

    /// Point the tile at a loaded image if it still belongs to `item`
    pub fn set_source(&mut self, id: PlaceholderId, item: ItemId, handle: ResourceHandle) -> bool {
        match self.placeholders.get_mut(&id) {
            Some(placeholder) if placeholder.item == item => {
                placeholder.source = Source::Loaded(handle);
                true
            }
            _ => false,
        }
    }

    pub fn mode(&self) -> Option<LayoutMode> {
        match self.structure {
            Structure::Empty => None,
            Structure::Columns(_) => Some(LayoutMode::Vertical),
            Structure::Flow(_) => Some(LayoutMode::Horizontal),
        }
    }

    pub fn content_height(&self) -> f32 {
        self.content_height
    }

    /// How many times the structure was rebuilt from scratch
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    /// Apply a layout pass; `order` lists the placeholder of each placed cell
    pub fn apply(&mut self, placement: &Placement, order: &[PlaceholderId]) {
        match placement.mode {
            LayoutMode::Horizontal => {
                let valid = matches!(&self.structure, Structure::Flow(flow) if flow.len() == order.len());
                if !valid {
                    self.structure = Structure::Flow(order.to_vec());
                    self.rebuilds += 1;
                }
            }
            LayoutMode::Vertical => {
                let mut fresh = vec![Vec::new(); placement.lanes];
                for (id, cell) in order.iter().zip(&placement.cells) {
                    fresh[cell.lane].push(*id);
                }

                match &mut self.structure {
                    Structure::Columns(columns) if columns.len() == fresh.len() => {
                        // Same containers, move tiles only where membership changed
                        for (column, wanted) in columns.iter_mut().zip(fresh) {
                            if *column != wanted {
                                *column = wanted;
                            }
                        }
                    }
                    _ => {
                        self.structure = Structure::Columns(fresh);
                        self.rebuilds += 1;
                    }
                }
            }
        }

        for (id, cell) in order.iter().zip(&placement.cells) {
            if let Some(placeholder) = self.placeholders.get_mut(id) {
                placeholder.lane = cell.lane;
                placeholder.rect = cell.rect;
                placeholder.placed = true;
            }
        }
        self.content_height = placement.content_height;
    }

    /// Tiles grouped the way the grid renders them: per column, or per row
    pub fn lanes(&self) -> Vec<Vec<&Placeholder>> {
        match &self.structure {
            Structure::Empty => Vec::new(),
            Structure::Columns(columns) => columns
                .iter()
                .map(|column| column.iter().filter_map(|id| self.placeholders.get(id)).collect())
                .collect(),
            Structure::Flow(flow) => {
                let mut rows: Vec<Vec<&Placeholder>> = Vec::new();
                for placeholder in flow.iter().filter_map(|id| self.placeholders.get(id)) {
                    match rows.last_mut() {
                        Some(row) if row[0].lane == placeholder.lane => row.push(placeholder),
                        _ => rows.push(vec![placeholder]),
                    }
                }
                rows
            }
        }
    }
}
