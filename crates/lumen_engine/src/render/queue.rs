//! Render queue
//!
//! Collects the drawable entities of one frame during scene traversal and
//! orders them back-to-front by depth before dispatch.

use crate::foundation::math::{Mat4, Rect};
use crate::scene::entity::{EntityId, EntityKind, Material};

/// Snapshot of one drawable entity for the current frame
#[derive(Debug, Clone)]
pub struct RenderItem {
    /// Entity drawn
    pub entity: EntityId,
    /// Kind tag used to select the render protocol
    pub kind: EntityKind,
    /// Layer; lower values are drawn first
    pub depth: i32,
    /// Composed world matrix
    pub world: Mat4,
    /// Color and opacity
    pub material: Material,
    /// World-space bounds
    pub bounds: Rect,
}

/// Ordered list of render items for a frame
#[derive(Debug, Default)]
pub struct RenderQueue {
    items: Vec<RenderItem>,
}

impl RenderQueue {
    /// Create an empty render queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item in traversal order
    pub fn push(&mut self, item: RenderItem) {
        self.items.push(item);
    }

    /// Sort back-to-front by depth; equal depths keep traversal order
    pub fn sort_by_depth(&mut self) {
        self.items.sort_by_key(|item| item.depth);
    }

    /// Items in current order
    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    /// Entity ids in current order
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.items.iter().map(|item| item.entity)
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every item, keeping the allocation
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
