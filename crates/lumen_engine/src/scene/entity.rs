//! Scene graph entity
//!
//! An [`Entity`] owns its children (through a [`Container`]) and its
//! components exclusively; destroying an entity destroys its subtree.
//! Instead of a class ladder, an entity carries a [`EntityKind`] tag, which
//! selects its render protocol, and [`Capabilities`] flags.
//!
//! ## Lifecycle
//!
//! `init` runs component hooks, then initializes children top-down.
//! Children and components added to an already initialized entity are
//! initialized immediately. `update`, `render` and `clean` fail with
//! [`EngineError::Lifecycle`] before `init` and after `destroy`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;

use super::component::{AttachedComponent, Component};
use super::components::tween::{EaseSettings, TweenComponent};
use super::container::Container;
use super::metrics::Metrics;
use crate::core::error::{EngineError, EngineResult};
use crate::core::lifecycle::{Lifecycle, LifecycleState};
use crate::foundation::color::Color;
use crate::foundation::math::{Mat4, Transformation, Vec2};
use crate::render::queue::{RenderItem, RenderQueue};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value, never zero
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind tag selecting the render protocol for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKind(&'static str);

impl EntityKind {
    /// Pure grouping node, never drawn
    pub const GROUP: Self = Self("group");
    /// Colored quad
    pub const QUAD: Self = Self("quad");

    /// Custom kind
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Tag name
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

bitflags! {
    /// What an entity can do
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// Queued for rendering
        const DRAWABLE = 1 << 0;
        /// Placed in the 2D plane through its transformation
        const POSITIONED_2D = 1 << 1;
        /// Eligible for hit testing against its bounds
        const SELECTABLE = 1 << 2;
    }
}

bitflags! {
    /// Runtime state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntityFlags: u8 {
        /// Skipped by update and render traversal
        const DISABLED = 1 << 0;
        /// Removed by the parent container after the current pass
        const DEAD = 1 << 1;
        /// Metrics are stale
        const DIRTY = 1 << 2;
    }
}

/// Surface appearance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Base color
    pub color: Color,
    /// Opacity multiplier in `[0, 1]`
    pub opacity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            opacity: 1.0,
        }
    }
}

/// Node of the scene graph
pub struct Entity {
    id: EntityId,
    name: String,
    kind: EntityKind,
    capabilities: Capabilities,
    flags: EntityFlags,
    depth: i32,
    transformation: Transformation,
    material: Material,
    metrics: Metrics,
    properties: HashMap<String, Box<dyn Any>>,
    children: Container,
    components: Vec<AttachedComponent>,
    lifecycle: Lifecycle,
}

impl Entity {
    /// Uninitialized entity of `kind`
    pub fn new(kind: EntityKind) -> Self {
        let id = EntityId::next();
        Self {
            id,
            name: format!("{kind}{id}"),
            kind,
            capabilities: Capabilities::empty(),
            flags: EntityFlags::DIRTY,
            depth: 0,
            transformation: Transformation::identity(),
            material: Material::default(),
            metrics: Metrics::default(),
            properties: HashMap::new(),
            children: Container::new(),
            components: Vec::new(),
            lifecycle: Lifecycle::new(),
        }
    }

    /// Grouping node
    pub fn group() -> Self {
        Self::new(EntityKind::GROUP).with_capabilities(Capabilities::POSITIONED_2D)
    }

    /// Drawable, selectable quad
    pub fn quad() -> Self {
        Self::new(EntityKind::QUAD).with_capabilities(
            Capabilities::DRAWABLE | Capabilities::POSITIONED_2D | Capabilities::SELECTABLE,
        )
    }

    /// Builder: name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: capabilities
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Builder: depth
    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }

    /// Builder: transformation
    pub fn with_transformation(mut self, transformation: Transformation) -> Self {
        self.transformation = transformation;
        self
    }

    /// Builder: color
    pub fn with_color(mut self, color: Color) -> Self {
        self.material.color = color;
        self
    }

    /// Unique id
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind tag
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Capability flags
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Whether every capability in `capabilities` is present
    pub const fn has_capability(&self, capabilities: Capabilities) -> bool {
        self.capabilities.contains(capabilities)
    }

    /// Runtime flags
    pub const fn flags(&self) -> EntityFlags {
        self.flags
    }

    /// Render layer; lower values are drawn first
    pub const fn depth(&self) -> i32 {
        self.depth
    }

    /// Change the render layer
    pub fn set_depth(&mut self, depth: i32) {
        self.depth = depth;
    }

    /// Local transformation
    pub const fn transformation(&self) -> &Transformation {
        &self.transformation
    }

    /// Mutable local transformation; marks the subtree dirty
    pub fn transformation_mut(&mut self) -> &mut Transformation {
        self.mark_dirty();
        &mut self.transformation
    }

    /// Replace the local transformation; marks the subtree dirty
    pub fn set_transformation(&mut self, transformation: Transformation) {
        *self.transformation_mut() = transformation;
    }

    /// Appearance
    pub const fn material(&self) -> &Material {
        &self.material
    }

    /// Mutable appearance
    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    /// Cached metrics; stale while [`Entity::is_dirty`]
    pub const fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Whether the metrics need recomputing
    pub const fn is_dirty(&self) -> bool {
        self.flags.contains(EntityFlags::DIRTY)
    }

    /// Mark this entity and every descendant dirty
    pub fn mark_dirty(&mut self) {
        self.flags.insert(EntityFlags::DIRTY);
        for child in self.children.iter_mut() {
            child.mark_dirty();
        }
    }

    /// Enable or disable update and render traversal of this subtree
    pub fn set_enabled(&mut self, enabled: bool) {
        self.flags.set(EntityFlags::DISABLED, !enabled);
    }

    /// Whether update and render traversal visit this subtree
    pub const fn is_enabled(&self) -> bool {
        !self.flags.contains(EntityFlags::DISABLED)
    }

    /// Ask the parent container to remove this entity after its current pass
    pub fn kill(&mut self) {
        self.flags.insert(EntityFlags::DEAD);
    }

    /// Whether [`Entity::kill`] was called
    pub const fn is_dead(&self) -> bool {
        self.flags.contains(EntityFlags::DEAD)
    }

    /// Lifecycle state
    pub const fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Whether `init` succeeded and `destroy` has not run
    pub fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    /// Whether `destroy` has run
    pub fn is_destroyed(&self) -> bool {
        self.lifecycle.is_destroyed()
    }

    // Properties

    /// Store an opaque value under `key`, replacing any previous value
    pub fn set_property<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.properties.insert(key.into(), Box::new(value));
    }

    /// Value under `key` if present and of type `T`
    pub fn property<T: Any>(&self, key: &str) -> Option<&T> {
        self.properties.get(key)?.downcast_ref()
    }

    /// Mutable value under `key` if present and of type `T`
    pub fn property_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.properties.get_mut(key)?.downcast_mut()
    }

    /// Whether any value is stored under `key`
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Remove the value under `key`
    pub fn remove_property(&mut self, key: &str) -> bool {
        self.properties.remove(key).is_some()
    }

    // Children

    /// Owned children
    pub const fn children(&self) -> &Container {
        &self.children
    }

    /// Owned children, mutably
    pub fn children_mut(&mut self) -> &mut Container {
        &mut self.children
    }

    /// Append a child, initializing it first if this entity is initialized.
    /// On init failure the child is dropped and nothing is appended.
    pub fn add_child(&mut self, mut child: Entity) -> EngineResult<EntityId> {
        if self.is_initialized() && child.state() == LifecycleState::Uninitialized {
            child.init()?;
        }
        child.mark_dirty();
        Ok(self.children.push(child))
    }

    /// Detach and destroy the direct child `id`
    pub fn remove_child(&mut self, id: EntityId) -> EngineResult<()> {
        self.children.remove(id)
    }

    /// Detach and destroy the child at `index`
    pub fn remove_child_at(&mut self, index: usize) -> EngineResult<()> {
        self.children.remove_at(index)
    }

    /// Depth-first search of the subtree below this entity
    pub fn find_descendant(&self, id: EntityId) -> Option<&Entity> {
        self.children.iter().find_map(|child| {
            if child.id == id {
                Some(child)
            } else {
                child.find_descendant(id)
            }
        })
    }

    /// Mutable depth-first search of the subtree below this entity
    pub fn find_descendant_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        for child in self.children.iter_mut() {
            if child.id == id {
                return Some(child);
            }
            if let Some(found) = child.find_descendant_mut(id) {
                return Some(found);
            }
        }
        None
    }

    /// Topmost entity of this subtree whose bounds contain `point`.
    ///
    /// Only enabled entities that are both `SELECTABLE` and `POSITIONED_2D`
    /// are hit; a disabled entity hides its subtree. Higher depth wins, then
    /// later traversal order, the same order the renderer draws in. Bounds
    /// come from the cached metrics, so clean the tree first.
    pub fn hit_test(&self, point: Vec2) -> Option<EntityId> {
        let mut top = None;
        self.hit_test_into(point, &mut top);
        top.map(|(_, id)| id)
    }

    fn hit_test_into(&self, point: Vec2, top: &mut Option<(i32, EntityId)>) {
        if !self.is_enabled() {
            return;
        }
        if self.has_capability(Capabilities::SELECTABLE | Capabilities::POSITIONED_2D)
            && self.metrics.bounds().contains(point)
            && top.map_or(true, |(depth, _)| self.depth >= depth)
        {
            *top = Some((self.depth, self.id));
        }
        for child in self.children.iter() {
            child.hit_test_into(point, top);
        }
    }

    // Components

    /// Attach a component, initializing it first if this entity is initialized
    pub fn add_component<C: Component>(&mut self, component: C) -> EngineResult<()> {
        let mut attached = AttachedComponent::new(Box::new(component));
        if self.is_initialized() {
            attached.init(self)?;
        }
        self.components.push(attached);
        Ok(())
    }

    /// Destroy (if initialized) and detach the first component of type `C`
    pub fn remove_component<C: Component>(&mut self) -> EngineResult<()> {
        let index = self
            .components
            .iter()
            .position(AttachedComponent::is::<C>)
            .ok_or_else(|| {
                EngineError::ObjectNotFoundInArray(format!(
                    "no {} attached to {}",
                    std::any::type_name::<C>(),
                    self.name
                ))
            })?;
        let mut attached = self.components.remove(index);
        if attached.lifecycle.is_initialized() {
            attached.destroy(self)?;
        }
        Ok(())
    }

    /// First component of type `C`
    pub fn component<C: Component>(&self) -> Option<&C> {
        self.components
            .iter()
            .find_map(|c| c.component.as_any().downcast_ref())
    }

    /// First component of type `C`, mutably
    pub fn component_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.components
            .iter_mut()
            .find_map(|c| c.component.as_any_mut().downcast_mut())
    }

    /// Whether a component of type `C` is attached
    pub fn has_component<C: Component>(&self) -> bool {
        self.components.iter().any(AttachedComponent::is::<C>)
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Animate from the current transformation to `destination`
    pub fn tween(&mut self, destination: Transformation, settings: EaseSettings) -> EngineResult<()> {
        let start = self.transformation;
        self.add_component(TweenComponent::new(start, destination, settings))
    }

    /// Run `hook` on every component with `self` as owner. Components added
    /// by a hook are appended after the existing ones.
    fn each_component<F>(&mut self, mut hook: F) -> EngineResult<()>
    where
        F: FnMut(&mut AttachedComponent, &mut Entity) -> EngineResult<()>,
    {
        let mut components = std::mem::take(&mut self.components);
        let result = components.iter_mut().try_for_each(|c| hook(c, self));
        components.append(&mut self.components);
        self.components = components;
        result
    }

    fn reap_done_components(&mut self) -> EngineResult<()> {
        if !self.components.iter().any(|c| c.component.is_done()) {
            return Ok(());
        }
        let (done, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.components)
            .into_iter()
            .partition(|c| c.component.is_done());
        self.components = kept;
        for mut attached in done {
            log::debug!("{}: detaching finished {}", self.name, attached.component.name());
            if attached.lifecycle.is_initialized() {
                attached.destroy(self)?;
            }
        }
        Ok(())
    }

    // Lifecycle

    /// Initialize components, then children top-down
    pub fn init(&mut self) -> EngineResult<()> {
        let mut next = self.lifecycle.clone();
        next.begin_init(&self.name)?;
        self.lifecycle = next;
        self.flags.insert(EntityFlags::DIRTY);

        self.each_component(|c, owner| c.init(owner))?;
        for child in self.children.iter_mut() {
            if child.state() == LifecycleState::Uninitialized {
                child.init()?;
            }
        }
        Ok(())
    }

    /// Run component updates, then update children. Finished components and
    /// dead children are removed afterwards. Disabled entities are skipped.
    pub fn update(&mut self, delta_time: f32) -> EngineResult<()> {
        self.lifecycle.require_live(&self.name, "update")?;
        if !self.is_enabled() {
            return Ok(());
        }
        self.each_component(|c, owner| c.component.update(owner, delta_time))?;
        self.children
            .traverse_mut(|child, _| child.update(delta_time))?;
        self.reap_done_components()
    }

    /// Queue this subtree for drawing. Disabled entities are skipped.
    pub fn render(&mut self, queue: &mut RenderQueue) -> EngineResult<()> {
        self.lifecycle.require_live(&self.name, "render")?;
        if !self.is_enabled() {
            return Ok(());
        }
        self.each_component(|c, owner| c.component.render(owner))?;
        if self.has_capability(Capabilities::DRAWABLE) {
            queue.push(RenderItem {
                entity: self.id,
                kind: self.kind,
                depth: self.depth,
                world: *self.metrics.world(),
                material: self.material,
                bounds: *self.metrics.bounds(),
            });
        }
        self.children.traverse_mut(|child, _| child.render(queue))
    }

    /// Recompute stale metrics for this subtree, treating this entity as root
    pub fn clean(&mut self) -> EngineResult<()> {
        self.clean_with(&Mat4::identity())
    }

    pub(crate) fn clean_with(&mut self, parent_world: &Mat4) -> EngineResult<()> {
        self.lifecycle.require_live(&self.name, "clean")?;
        if self.is_dirty() {
            self.metrics.recompute(parent_world, &self.transformation);
            self.flags.remove(EntityFlags::DIRTY);
            self.each_component(|c, owner| c.component.clean(owner))?;
        }
        let world = *self.metrics.world();
        self.children
            .traverse_mut(|child, _| child.clean_with(&world))
    }

    /// Destroy children bottom-up, then components, then this entity
    pub fn destroy(&mut self) -> EngineResult<()> {
        self.lifecycle.require_live(&self.name, "destroy")?;
        self.children.clear()?;
        self.each_component(|c, owner| {
            if c.lifecycle.is_initialized() {
                c.destroy(owner)
            } else {
                Ok(())
            }
        })?;
        self.components.clear();
        self.properties.clear();
        self.lifecycle.begin_destroy(&self.name)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .field("depth", &self.depth)
            .field("state", &self.lifecycle.state())
            .field("children", &self.children.len())
            .field("components", &self.components)
            .finish_non_exhaustive()
    }
}
