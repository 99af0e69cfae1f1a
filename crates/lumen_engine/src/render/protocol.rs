//! Render protocols: per-kind draw strategies
//!
//! The renderer never inspects an entity's kind itself. It looks the kind up
//! in a [`ProtocolRegistry`] and hands the queued [`RenderItem`] to whatever
//! protocol is registered for it. A protocol owns the GPU state shared by
//! every entity of its kind and, optionally, per-entity state allocated in
//! [`RenderProtocol::set_up`].

use std::collections::{HashMap, HashSet};

use crate::core::error::{EngineError, EngineResult};
use crate::core::lifecycle::Lifecycle;
use crate::render::backend::GraphicsDevice;
use crate::render::queue::RenderItem;
use crate::scene::entity::{EntityId, EntityKind};

/// Draw strategy for one entity kind
#[allow(unused_variables)]
pub trait RenderProtocol {
    /// Name for logs and errors
    fn name(&self) -> &str;

    /// Allocate state shared by every entity of the kind. Called once,
    /// before the first entity of the kind is set up.
    fn init(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()>;

    /// Allocate per-entity state. Called the first frame `item.entity` is drawn.
    fn set_up(&mut self, device: &mut dyn GraphicsDevice, item: &RenderItem) -> EngineResult<()> {
        Ok(())
    }

    /// Issue the draw calls for one entity
    fn render(&mut self, device: &mut dyn GraphicsDevice, item: &RenderItem) -> EngineResult<()>;

    /// React to a new render target size
    fn resize(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) -> EngineResult<()> {
        Ok(())
    }

    /// Release per-entity state of an entity that is no longer drawn
    fn release(&mut self, device: &mut dyn GraphicsDevice, entity: EntityId) -> EngineResult<()> {
        Ok(())
    }

    /// Release shared state
    fn destroy(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()>;
}

struct ProtocolEntry {
    kind: EntityKind,
    protocol: Box<dyn RenderProtocol>,
    lifecycle: Lifecycle,
    entities: HashSet<EntityId>,
}

impl ProtocolEntry {
    fn draw(
        &mut self,
        device: &mut dyn GraphicsDevice,
        item: &RenderItem,
        extent: Option<(u32, u32)>,
    ) -> EngineResult<()> {
        if !self.lifecycle.is_initialized() {
            let mut next = self.lifecycle.clone();
            next.begin_init(self.protocol.name())?;
            self.protocol.init(device)?;
            self.lifecycle = next;
            if let Some((width, height)) = extent {
                self.protocol.resize(device, width, height)?;
            }
            log::debug!("Initialized render protocol {} for kind '{}'", self.protocol.name(), self.kind);
        }

        if !self.entities.contains(&item.entity) {
            self.protocol.set_up(device, item)?;
            self.entities.insert(item.entity);
        }
        self.protocol.render(device, item)
    }
}

/// Protocols keyed by entity kind
#[derive(Default)]
pub struct ProtocolRegistry {
    entries: Vec<ProtocolEntry>,
    slots: HashMap<EntityKind, usize>,
    extent: Option<(u32, u32)>,
    lookups: u64,
}

impl ProtocolRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `protocol` for `kind`. A kind can only be registered once.
    pub fn register(&mut self, kind: EntityKind, protocol: Box<dyn RenderProtocol>) -> EngineResult<()> {
        if self.slots.contains_key(&kind) {
            return Err(EngineError::lifecycle(format!(
                "a render protocol is already registered for kind '{kind}'"
            )));
        }
        log::debug!("Registered render protocol {} for kind '{}'", protocol.name(), kind);
        self.slots.insert(kind, self.entries.len());
        self.entries.push(ProtocolEntry {
            kind,
            protocol,
            lifecycle: Lifecycle::new(),
            entities: HashSet::new(),
        });
        Ok(())
    }

    /// Whether `kind` has a protocol
    pub fn contains(&self, kind: EntityKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no kind is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entities of `kind` holding per-entity state
    pub fn set_up_count(&self, kind: EntityKind) -> usize {
        self.slots.get(&kind).map_or(0, |&slot| self.entries[slot].entities.len())
    }

    /// Kind lookups performed so far. Dispatching a batch costs one per
    /// distinct kind in it.
    pub const fn lookups(&self) -> u64 {
        self.lookups
    }

    fn resolve(&mut self, item: &RenderItem) -> EngineResult<usize> {
        self.lookups += 1;
        self.slots.get(&item.kind).copied().ok_or_else(|| {
            EngineError::DependencyNotFound(format!(
                "no render protocol registered for kind '{}' (entity {})",
                item.kind, item.entity
            ))
        })
    }

    /// Draw one item through its kind's protocol, initializing the protocol
    /// and setting the entity up on first use. Fails with
    /// `DependencyNotFound` if the kind has no protocol.
    pub fn dispatch(&mut self, device: &mut dyn GraphicsDevice, item: &RenderItem) -> EngineResult<()> {
        self.dispatch_all(device, std::slice::from_ref(item))
    }

    /// Draw `items` in order. Each kind is looked up once per call, so a
    /// whole frame resolves its protocols once.
    pub fn dispatch_all(&mut self, device: &mut dyn GraphicsDevice, items: &[RenderItem]) -> EngineResult<()> {
        let mut resolved: Vec<(EntityKind, usize)> = Vec::new();
        for item in items {
            let slot = match resolved.iter().find(|(kind, _)| *kind == item.kind) {
                Some(&(_, slot)) => slot,
                None => {
                    let slot = self.resolve(item)?;
                    resolved.push((item.kind, slot));
                    slot
                }
            };
            self.entries[slot].draw(device, item, self.extent)?;
        }
        Ok(())
    }

    /// Release per-entity state for every entity not in `drawn`
    pub fn release_absent(&mut self, device: &mut dyn GraphicsDevice, drawn: &HashSet<EntityId>) -> EngineResult<()> {
        for entry in &mut self.entries {
            let absent: Vec<EntityId> = entry.entities.difference(drawn).copied().collect();
            for entity in absent {
                entry.entities.remove(&entity);
                entry.protocol.release(device, entity)?;
            }
        }
        Ok(())
    }

    /// Forward a target resize to every initialized protocol. Protocols
    /// initialized later receive the last size right after their `init`.
    pub fn resize(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) -> EngineResult<()> {
        self.extent = Some((width, height));
        for entry in &mut self.entries {
            if entry.lifecycle.is_initialized() {
                entry.protocol.resize(device, width, height)?;
            }
        }
        Ok(())
    }

    /// Release every entity and destroy every initialized protocol. The
    /// registrations are kept; protocols initialize again on next use.
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        for entry in &mut self.entries {
            for entity in std::mem::take(&mut entry.entities) {
                entry.protocol.release(device, entity)?;
            }
            if entry.lifecycle.is_initialized() {
                entry.protocol.destroy(device)?;
                entry.lifecycle = Lifecycle::new();
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProtocolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|e| (e.kind.name(), e.protocol.name())))
            .finish()
    }
}
