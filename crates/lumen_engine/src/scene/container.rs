//! Ordered, index-addressable collection of owned child entities
//!
//! Indices are positions, not identities: removing child `i` shifts every
//! later child down by one. Use [`EntityId`] for stable references.
//!
//! Removal requested while the container is being traversed (through
//! [`Container::traverse_mut`]) is validated immediately and applied once
//! the pass ends, together with any children that marked themselves dead.

use super::entity::{Entity, EntityId};
use crate::core::error::{check_index, EngineError, EngineResult};

/// Removals scheduled during a traversal pass
#[derive(Debug)]
pub struct PendingRemovals {
    members: Vec<EntityId>,
    queued: Vec<EntityId>,
}

impl PendingRemovals {
    /// Schedule removal of the sibling `id` once the pass ends.
    /// Fails with `ObjectNotFoundInArray` if `id` is not a member or is
    /// already scheduled.
    pub fn remove(&mut self, id: EntityId) -> EngineResult<()> {
        if !self.members.contains(&id) || self.queued.contains(&id) {
            return Err(EngineError::ObjectNotFoundInArray(format!(
                "entity {id} is not a child of this container"
            )));
        }
        self.queued.push(id);
        Ok(())
    }

    /// Number of removals scheduled so far
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    /// Whether nothing is scheduled
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}

/// Owned children of an entity
#[derive(Debug, Default)]
pub struct Container {
    children: Vec<Entity>,
}

impl Container {
    /// Empty container
    pub const fn new() -> Self {
        Self {
            children: Vec::new(),
        }
    }

    /// Number of children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether there are no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child at `index`
    pub fn get(&self, index: usize) -> EngineResult<&Entity> {
        check_index(index, self.children.len())?;
        Ok(&self.children[index])
    }

    /// Child at `index`, mutably
    pub fn get_mut(&mut self, index: usize) -> EngineResult<&mut Entity> {
        check_index(index, self.children.len())?;
        Ok(&mut self.children[index])
    }

    /// Direct child with `id`
    pub fn find(&self, id: EntityId) -> Option<&Entity> {
        self.children.iter().find(|c| c.id() == id)
    }

    /// Direct child with `id`, mutably
    pub fn find_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.children.iter_mut().find(|c| c.id() == id)
    }

    /// Current index of the direct child `id`
    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.children.iter().position(|c| c.id() == id)
    }

    /// Whether `id` is a direct child
    pub fn contains(&self, id: EntityId) -> bool {
        self.index_of(id).is_some()
    }

    /// Children in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.children.iter()
    }

    /// Children in insertion order, mutably
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entity> {
        self.children.iter_mut()
    }

    /// Ids of the children in insertion order
    pub fn ids(&self) -> Vec<EntityId> {
        self.children.iter().map(Entity::id).collect()
    }

    pub(crate) fn push(&mut self, child: Entity) -> EntityId {
        let id = child.id();
        self.children.push(child);
        id
    }

    /// Detach and destroy the child `id`. Fails with `ObjectNotFoundInArray`
    /// if it is not a direct child; the container is unchanged then.
    pub fn remove(&mut self, id: EntityId) -> EngineResult<()> {
        let index = self.index_of(id).ok_or_else(|| {
            EngineError::ObjectNotFoundInArray(format!(
                "entity {id} is not a child of this container"
            ))
        })?;
        Self::dispose(self.children.remove(index))
    }

    /// Detach and destroy the child at `index`. Fails with
    /// `IndexOutOfBounds` if `index >= len()`; the container is unchanged then.
    pub fn remove_at(&mut self, index: usize) -> EngineResult<()> {
        check_index(index, self.children.len())?;
        Self::dispose(self.children.remove(index))
    }

    /// Destroy every child, last to first
    pub fn clear(&mut self) -> EngineResult<()> {
        while let Some(child) = self.children.pop() {
            Self::dispose(child)?;
        }
        Ok(())
    }

    /// Visit children in insertion order. `visit` may schedule sibling
    /// removals; those and any dead children are removed after the pass,
    /// even if a visit failed. The first error is returned.
    pub fn traverse_mut<F>(&mut self, mut visit: F) -> EngineResult<()>
    where
        F: FnMut(&mut Entity, &mut PendingRemovals) -> EngineResult<()>,
    {
        let mut pending = PendingRemovals {
            members: self.ids(),
            queued: Vec::new(),
        };
        let result = self
            .children
            .iter_mut()
            .try_for_each(|child| visit(child, &mut pending));

        let settle = self.settle(pending.queued);
        result.and(settle)
    }

    fn settle(&mut self, queued: Vec<EntityId>) -> EngineResult<()> {
        let mut first_error = None;
        for id in queued {
            if let Err(e) = self.remove(id) {
                first_error.get_or_insert(e);
            }
        }
        while let Some(index) = self.children.iter().position(Entity::is_dead) {
            log::trace!("reaping dead entity {}", self.children[index].id());
            if let Err(e) = Self::dispose(self.children.remove(index)) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn dispose(mut child: Entity) -> EngineResult<()> {
        if child.is_initialized() {
            child.destroy()
        } else {
            Ok(())
        }
    }
}

impl<'a> IntoIterator for &'a Container {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}
