//! Graphics module: owns the scene root and the renderer
//!
//! Every frame the module updates the scene, recomputes stale metrics and
//! renders exactly one frame. The renderer is built by a factory and the
//! scene by an optional builder on every `init`, so the module restarts
//! cleanly when a destroyed [`System`](super::System) is initialized again.
//! `init` either commits a set-up renderer and a fully built scene, or
//! leaves the module as it was.

use std::any::Any;

use crate::core::config::RendererConfig;
use crate::core::error::{EngineError, EngineResult};
use crate::render::headless::{HeadlessDevice, HeadlessSurface};
use crate::render::protocols::QuadProtocol;
use crate::render::renderer::{Renderer, StandardRenderer};
use crate::scene::entity::{Entity, EntityKind};

use super::module::{FrameContext, Module};

type RendererFactory = Box<dyn FnMut() -> EngineResult<Box<dyn Renderer>>>;
type SceneBuilder = Box<dyn FnMut(&mut Entity) -> EngineResult<()>>;

/// Module drawing one scene graph
pub struct GraphicsModule {
    name: String,
    factory: RendererFactory,
    builder: Option<SceneBuilder>,
    renderer: Option<Box<dyn Renderer>>,
    root: Entity,
    pending_size: Option<(u32, u32)>,
}

impl GraphicsModule {
    /// Module named `"graphics"` whose renderer comes from `factory`
    pub fn new<F>(factory: F) -> Self
    where
        F: FnMut() -> EngineResult<Box<dyn Renderer>> + 'static,
    {
        Self {
            name: "graphics".to_string(),
            factory: Box::new(factory),
            builder: None,
            renderer: None,
            root: Entity::group().with_name("root"),
            pending_size: None,
        }
    }

    /// Module rendering quads on a [`HeadlessDevice`]
    pub fn headless(config: &RendererConfig) -> Self {
        let config = config.clone();
        Self::new(move || {
            let renderer = StandardRenderer::new(
                HeadlessDevice::new(),
                HeadlessSurface::new(config.width, config.height),
                &config,
            )
            .with_protocol(EntityKind::QUAD, QuadProtocol::new())?;
            Ok(Box::new(renderer) as Box<dyn Renderer>)
        })
    }

    /// Builder: module name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: populate the root on every `init`
    pub fn with_scene<F>(mut self, builder: F) -> Self
    where
        F: FnMut(&mut Entity) -> EngineResult<()> + 'static,
    {
        self.builder = Some(Box::new(builder));
        self
    }

    /// Scene root
    pub const fn root(&self) -> &Entity {
        &self.root
    }

    /// Scene root, mutably. Every `init` replaces the root with a fresh one
    /// filled by the scene builder.
    pub fn root_mut(&mut self) -> &mut Entity {
        &mut self.root
    }

    /// Current renderer, between `init` and `destroy`
    pub fn renderer(&self) -> Option<&dyn Renderer> {
        self.renderer.as_deref()
    }

    /// Current renderer downcast to `R`
    pub fn renderer_as<R: Renderer + 'static>(&self) -> Option<&R> {
        self.renderer.as_ref()?.as_any().downcast_ref()
    }

    /// Forward a surface resize. Before `init` the size is kept and applied
    /// right after set-up.
    pub fn resize(&mut self, width: u32, height: u32) -> EngineResult<()> {
        match self.renderer.as_mut() {
            Some(renderer) => renderer.resize(width, height),
            None => {
                self.pending_size = Some((width, height));
                Ok(())
            }
        }
    }

    fn build(&mut self, renderer: &mut dyn Renderer) -> EngineResult<Entity> {
        if let Some((width, height)) = self.pending_size {
            renderer.resize(width, height)?;
        }
        let mut root = Entity::group().with_name("root");
        if let Some(builder) = self.builder.as_mut() {
            builder(&mut root)?;
        }
        root.init()?;
        Ok(root)
    }

    fn renderer_mut(&mut self) -> EngineResult<&mut Box<dyn Renderer>> {
        let name = &self.name;
        self.renderer
            .as_mut()
            .ok_or_else(|| EngineError::lifecycle(format!("module '{name}' has no renderer before init")))
    }
}

impl Module for GraphicsModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self) -> EngineResult<()> {
        let mut renderer = (self.factory)()?;
        renderer.set_up()?;
        match self.build(renderer.as_mut()) {
            Ok(root) => {
                self.pending_size = None;
                self.renderer = Some(renderer);
                self.root = root;
                Ok(())
            }
            Err(error) => {
                if let Err(cleanup) = renderer.destroy() {
                    log::warn!("Module '{}' could not release its renderer: {cleanup}", self.name);
                }
                Err(error)
            }
        }
    }

    fn update(&mut self, frame: &mut FrameContext) -> EngineResult<()> {
        self.root.update(frame.delta_time())?;
        self.root.clean()?;
        let root = &mut self.root;
        match self.renderer.as_mut() {
            Some(renderer) => renderer.render_frame(root),
            None => Err(EngineError::lifecycle(format!(
                "module '{}' updated before init",
                self.name
            ))),
        }
    }

    fn destroy(&mut self) -> EngineResult<()> {
        self.root.destroy()?;
        self.renderer_mut()?.destroy()?;
        self.renderer = None;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
