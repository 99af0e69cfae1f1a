//! Framebuffers and renderbuffers

use super::{Bindable, GpuObject, GpuResource, Texture};
use crate::core::error::EngineResult;
use crate::render::backend::{
    Attachment, BindTarget, FramebufferStatus, GraphicsDevice, NativeHandle, ObjectKind,
    PixelFormat,
};

/// Renderbuffer: render target storage that is never sampled
#[derive(Debug)]
pub struct RenderBuffer {
    object: GpuObject,
    storage: Option<(PixelFormat, u32, u32)>,
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBuffer {
    /// Uninitialized renderbuffer
    pub const fn new() -> Self {
        Self {
            object: GpuObject::new("RenderBuffer", ObjectKind::RenderBuffer, BindTarget::RenderBuffer),
            storage: None,
        }
    }

    /// Allocate storage. The renderbuffer must be bound.
    pub fn set_storage(
        &mut self,
        device: &mut dyn GraphicsDevice,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> EngineResult<()> {
        self.object.bound_handle(device, "set_storage")?;
        device.renderbuffer_storage(format, width, height)?;
        self.storage = Some((format, width, height));
        Ok(())
    }

    /// Allocated storage, if any
    pub const fn storage(&self) -> Option<(PixelFormat, u32, u32)> {
        self.storage
    }

    /// Native handle while live
    pub const fn handle(&self) -> Option<NativeHandle> {
        self.object.handle()
    }
}

impl GpuResource for RenderBuffer {
    fn init(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.create(device)
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.release(device)
    }

    fn is_created(&self) -> bool {
        self.object.is_created()
    }
}

impl Bindable for RenderBuffer {
    fn bind(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.bind(device)
    }

    fn unbind(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.unbind(device)
    }

    fn is_bound(&self, device: &dyn GraphicsDevice) -> bool {
        self.object.is_bound(device)
    }
}

/// Framebuffer object. Attachments are referenced, not owned.
#[derive(Debug)]
pub struct FrameBuffer {
    object: GpuObject,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Uninitialized framebuffer
    pub const fn new() -> Self {
        Self {
            object: GpuObject::new("FrameBuffer", ObjectKind::FrameBuffer, BindTarget::FrameBuffer),
        }
    }

    /// Native handle while live
    pub const fn handle(&self) -> Option<NativeHandle> {
        self.object.handle()
    }

    /// Attach a texture. The framebuffer must be bound.
    pub fn attach_texture(
        &mut self,
        device: &mut dyn GraphicsDevice,
        attachment: Attachment,
        texture: &Texture,
    ) -> EngineResult<()> {
        self.object.bound_handle(device, "attach_texture")?;
        let texture = texture.object.live_handle("attach as framebuffer texture")?;
        device.framebuffer_texture(attachment, texture)
    }

    /// Attach a renderbuffer. The framebuffer must be bound.
    pub fn attach_renderbuffer(
        &mut self,
        device: &mut dyn GraphicsDevice,
        attachment: Attachment,
        renderbuffer: &RenderBuffer,
    ) -> EngineResult<()> {
        self.object.bound_handle(device, "attach_renderbuffer")?;
        let renderbuffer = renderbuffer
            .object
            .live_handle("attach as framebuffer renderbuffer")?;
        device.framebuffer_renderbuffer(attachment, renderbuffer)
    }

    /// Select the color attachments written. The framebuffer must be bound.
    pub fn set_draw_buffers(&mut self, device: &mut dyn GraphicsDevice, color_attachments: &[u32]) -> EngineResult<()> {
        self.object.bound_handle(device, "set_draw_buffers")?;
        device.draw_buffers(color_attachments)
    }

    /// Completeness check. The framebuffer must be bound.
    pub fn check_status(&self, device: &dyn GraphicsDevice) -> EngineResult<FramebufferStatus> {
        self.object.bound_handle(device, "check_status")?;
        device.framebuffer_status()
    }

    /// Copy into the default framebuffer
    pub fn blit_to_screen(
        &self,
        device: &mut dyn GraphicsDevice,
        source_size: (u32, u32),
        screen_size: (u32, u32),
    ) -> EngineResult<()> {
        let handle = self.object.live_handle("blit")?;
        device.blit_framebuffer(handle, source_size, None, screen_size)
    }
}

impl GpuResource for FrameBuffer {
    fn init(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.create(device)
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.release(device)
    }

    fn is_created(&self) -> bool {
        self.object.is_created()
    }
}

impl Bindable for FrameBuffer {
    fn bind(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.bind(device)
    }

    fn unbind(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.unbind(device)
    }

    fn is_bound(&self, device: &dyn GraphicsDevice) -> bool {
        self.object.is_bound(device)
    }
}
