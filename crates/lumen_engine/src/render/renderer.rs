//! Frame renderer
//!
//! A [`Renderer`] turns one scene graph into one presented frame:
//!
//! 1. clear the render target with the refresh color
//! 2. walk the scene and queue drawable entities
//! 3. order the queue by depth (stable) and dispatch each item to the
//!    protocol registered for its kind
//! 4. release per-entity protocol state of entities no longer drawn
//! 5. copy the offscreen target to the screen and present
//!
//! The renderer only knows kinds as registry keys; it never inspects what an
//! entity is.

use std::any::Any;
use std::collections::HashSet;

use crate::core::config::RendererConfig;
use crate::core::error::{EngineError, EngineResult};
use crate::core::lifecycle::Lifecycle;
use crate::foundation::color::Color;
use crate::render::backend::{
    Attachment, ClearFlags, FramebufferStatus, GraphicsDevice, PixelFormat, RenderSurface, TextureDesc,
};
use crate::render::protocol::{ProtocolRegistry, RenderProtocol};
use crate::render::queue::RenderQueue;
use crate::render::resources::{Bindable, FrameBuffer, GpuResource, RenderBuffer, Texture};
use crate::scene::entity::{Entity, EntityKind};

/// Drives one frame at a time
pub trait Renderer {
    /// Acquire the render target. The surface must already be usable.
    fn set_up(&mut self) -> EngineResult<()>;

    /// Follow a surface size change
    fn resize(&mut self, width: u32, height: u32) -> EngineResult<()>;

    /// Clear, draw `root`'s subtree and present
    fn render_frame(&mut self, root: &mut Entity) -> EngineResult<()>;

    /// Clear color and depth of the current target
    fn clear_buffers(&mut self) -> EngineResult<()>;

    /// Color used by [`Renderer::clear_buffers`]
    fn set_refresh_color(&mut self, color: Color);

    /// Release every GPU object owned by the renderer and its protocols
    fn destroy(&mut self) -> EngineResult<()>;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Offscreen color + depth target
#[derive(Debug)]
struct OffscreenTarget {
    framebuffer: FrameBuffer,
    color: Texture,
    depth: RenderBuffer,
    size: (u32, u32),
}

impl OffscreenTarget {
    fn create(device: &mut dyn GraphicsDevice, width: u32, height: u32) -> EngineResult<Self> {
        let mut color = Texture::new();
        color.init(device)?;
        color.bind(device)?;
        color.set_data(device, &TextureDesc::rgba8(width, height), None)?;
        color.unbind(device)?;

        let mut depth = RenderBuffer::new();
        depth.init(device)?;
        depth.bind(device)?;
        depth.set_storage(device, PixelFormat::Depth24Stencil8, width, height)?;
        depth.unbind(device)?;

        let mut framebuffer = FrameBuffer::new();
        framebuffer.init(device)?;
        framebuffer.bind(device)?;
        framebuffer.attach_texture(device, Attachment::Color(0), &color)?;
        framebuffer.attach_renderbuffer(device, Attachment::DepthStencil, &depth)?;
        framebuffer.set_draw_buffers(device, &[0])?;
        let status = framebuffer.check_status(device)?;
        framebuffer.unbind(device)?;

        let mut target = Self {
            framebuffer,
            color,
            depth,
            size: (width, height),
        };
        if status != FramebufferStatus::Complete {
            target.destroy(device)?;
            return Err(EngineError::backend(format!(
                "offscreen framebuffer {width}x{height} is incomplete: {status:?}"
            )));
        }
        Ok(target)
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.framebuffer.destroy(device)?;
        self.depth.destroy(device)?;
        self.color.destroy(device)
    }
}

/// Renderer over any [`GraphicsDevice`] and [`RenderSurface`]
pub struct StandardRenderer<D: GraphicsDevice, S: RenderSurface> {
    device: D,
    surface: S,
    protocols: ProtocolRegistry,
    queue: RenderQueue,
    refresh_color: Color,
    offscreen: bool,
    target: Option<OffscreenTarget>,
    size: (u32, u32),
    frames: u64,
    lifecycle: Lifecycle,
}

impl<D: GraphicsDevice, S: RenderSurface> StandardRenderer<D, S> {
    /// Renderer presenting to `surface`, configured from `config`
    pub fn new(device: D, surface: S, config: &RendererConfig) -> Self {
        let size = surface.size();
        Self {
            device,
            surface,
            protocols: ProtocolRegistry::new(),
            queue: RenderQueue::new(),
            refresh_color: config.refresh_color,
            offscreen: config.offscreen,
            target: None,
            size,
            frames: 0,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Builder: register a protocol
    pub fn with_protocol(mut self, kind: EntityKind, protocol: impl RenderProtocol + 'static) -> EngineResult<Self> {
        self.register_protocol(kind, protocol)?;
        Ok(self)
    }

    /// Register the protocol drawing entities of `kind`
    pub fn register_protocol(&mut self, kind: EntityKind, protocol: impl RenderProtocol + 'static) -> EngineResult<()> {
        self.protocols.register(kind, Box::new(protocol))
    }

    /// Registered protocols
    pub const fn protocols(&self) -> &ProtocolRegistry {
        &self.protocols
    }

    /// Backend device
    pub const fn device(&self) -> &D {
        &self.device
    }

    /// Backend device, mutably
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Presentation surface
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Presentation surface, mutably
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Current target size
    pub const fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Frames rendered since set-up
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Current refresh color
    pub const fn refresh_color(&self) -> Color {
        self.refresh_color
    }

    fn bind_target(&mut self) -> EngineResult<()> {
        match &self.target {
            Some(target) => target.framebuffer.bind(&mut self.device),
            None => Ok(()),
        }
    }

    fn unbind_target(&mut self) -> EngineResult<()> {
        match &self.target {
            Some(target) => target.framebuffer.unbind(&mut self.device),
            None => Ok(()),
        }
    }

    fn draw_queue(&mut self, root: &mut Entity) -> EngineResult<()> {
        self.queue.clear();
        root.render(&mut self.queue)?;
        self.queue.sort_by_depth();

        self.protocols.dispatch_all(&mut self.device, self.queue.items())?;
        let drawn: HashSet<_> = self.queue.entity_ids().collect();
        self.protocols.release_absent(&mut self.device, &drawn)
    }
}

impl<D: GraphicsDevice + 'static, S: RenderSurface + 'static> Renderer for StandardRenderer<D, S> {
    fn set_up(&mut self) -> EngineResult<()> {
        let mut next = self.lifecycle.clone();
        next.begin_init("StandardRenderer")?;

        let (width, height) = self.surface.size();
        if width == 0 || height == 0 {
            return Err(EngineError::backend(format!(
                "surface reports an empty size {width}x{height}"
            )));
        }
        self.size = (width, height);
        self.device.viewport(0, 0, width, height);
        self.device.clear_color(self.refresh_color);
        self.protocols.resize(&mut self.device, width, height)?;
        // last fallible step: nothing can fail after the target exists
        if self.offscreen {
            self.target = Some(OffscreenTarget::create(&mut self.device, width, height)?);
        }

        self.lifecycle = next;
        log::info!(
            "Renderer set up on {} at {}x{} ({})",
            self.device.name(),
            width,
            height,
            if self.offscreen { "offscreen" } else { "direct" }
        );
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> EngineResult<()> {
        self.lifecycle.require_live("StandardRenderer", "resize")?;
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to {}x{}", width, height);
            return Ok(());
        }
        if (width, height) == self.size {
            return Ok(());
        }
        log::debug!("Renderer resized to {}x{}", width, height);
        self.size = (width, height);
        self.device.viewport(0, 0, width, height);
        if let Some(mut old) = self.target.take() {
            old.destroy(&mut self.device)?;
            self.target = Some(OffscreenTarget::create(&mut self.device, width, height)?);
        }
        self.protocols.resize(&mut self.device, width, height)
    }

    fn render_frame(&mut self, root: &mut Entity) -> EngineResult<()> {
        self.lifecycle.require_live("StandardRenderer", "render_frame")?;
        self.device.begin_frame();
        self.bind_target()?;

        // the target is unbound whether clearing or drawing failed
        let drawn = self.clear_buffers().and_then(|()| self.draw_queue(root));
        let unbound = self.unbind_target();
        drawn.and(unbound)?;

        if let Some(target) = &self.target {
            target
                .framebuffer
                .blit_to_screen(&mut self.device, target.size, self.size)?;
        }
        self.surface.swap_buffers()?;
        self.frames += 1;
        Ok(())
    }

    fn clear_buffers(&mut self) -> EngineResult<()> {
        self.lifecycle.require_live("StandardRenderer", "clear_buffers")?;
        self.device.clear_color(self.refresh_color);
        self.device.clear(ClearFlags::COLOR | ClearFlags::DEPTH)
    }

    fn set_refresh_color(&mut self, color: Color) {
        self.refresh_color = color;
    }

    fn destroy(&mut self) -> EngineResult<()> {
        self.lifecycle.require_live("StandardRenderer", "destroy")?;
        self.protocols.destroy(&mut self.device)?;
        if let Some(mut target) = self.target.take() {
            target.destroy(&mut self.device)?;
        }
        self.queue.clear();
        log::info!("Renderer destroyed after {} frames", self.frames);
        self.lifecycle.begin_destroy("StandardRenderer")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<D: GraphicsDevice, S: RenderSurface> std::fmt::Debug for StandardRenderer<D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardRenderer")
            .field("device", &self.device.name())
            .field("size", &self.size)
            .field("offscreen", &self.offscreen)
            .field("protocols", &self.protocols)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}
