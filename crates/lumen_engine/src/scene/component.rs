//! Components: behavior attached to exactly one entity
//!
//! Hooks receive the owning entity. While a hook runs, the owner's
//! component list is detached, so a hook can add components (they are
//! appended after the current pass) but cannot look itself up.

use std::any::Any;

use crate::core::error::EngineResult;
use crate::core::lifecycle::Lifecycle;

use super::entity::Entity;

/// Behavior attached to an entity
#[allow(unused_variables)]
pub trait Component: Any {
    /// Name for logs and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called once, when the owner initializes or when attached to an
    /// initialized owner
    fn init(&mut self, owner: &mut Entity) -> EngineResult<()> {
        Ok(())
    }

    /// Called every update before the owner's children update
    fn update(&mut self, owner: &mut Entity, delta_time: f32) -> EngineResult<()> {
        Ok(())
    }

    /// Called every render traversal before the owner is queued
    fn render(&mut self, owner: &mut Entity) -> EngineResult<()> {
        Ok(())
    }

    /// Called after the owner's metrics were recomputed
    fn clean(&mut self, owner: &mut Entity) -> EngineResult<()> {
        Ok(())
    }

    /// Called once, when the owner is destroyed or the component is removed
    fn destroy(&mut self, owner: &mut Entity) -> EngineResult<()> {
        Ok(())
    }

    /// A done component is destroyed and detached after the owner's update
    fn is_done(&self) -> bool {
        false
    }

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A component together with its own lifecycle guard
pub(crate) struct AttachedComponent {
    pub(crate) component: Box<dyn Component>,
    pub(crate) lifecycle: Lifecycle,
}

impl AttachedComponent {
    pub(crate) fn new(component: Box<dyn Component>) -> Self {
        Self {
            component,
            lifecycle: Lifecycle::new(),
        }
    }

    pub(crate) fn init(&mut self, owner: &mut Entity) -> EngineResult<()> {
        let mut next = self.lifecycle.clone();
        next.begin_init(self.component.name())?;
        self.component.init(owner)?;
        self.lifecycle = next;
        Ok(())
    }

    pub(crate) fn destroy(&mut self, owner: &mut Entity) -> EngineResult<()> {
        self.lifecycle.require_live(self.component.name(), "destroy")?;
        self.component.destroy(owner)?;
        self.lifecycle.begin_destroy(self.component.name())
    }

    pub(crate) fn is<C: Component>(&self) -> bool {
        self.component.as_any().is::<C>()
    }
}

impl std::fmt::Debug for AttachedComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachedComponent")
            .field("name", &self.component.name())
            .field("state", &self.lifecycle.state())
            .finish()
    }
}
