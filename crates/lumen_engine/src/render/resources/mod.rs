//! GPU resource objects
//!
//! Every object wraps exactly one native handle, created in `init` and
//! deleted in `destroy`. Objects are move-only; [`GpuObject::transfer`]
//! moves the handle out of a borrowed slot and leaves the source inert.
//! Calls that upload data or change parameters require the object to be
//! bound first; debug builds check this and fail with
//! [`EngineError::Lifecycle`].

pub mod buffer;
pub mod framebuffer;
pub mod shader;
pub mod texture;
pub mod vertex_array;

pub use buffer::Buffer;
pub use framebuffer::{FrameBuffer, RenderBuffer};
pub use shader::{Shader, ShaderProgram};
pub use texture::Texture;
pub use vertex_array::VertexArray;

use crate::core::error::{EngineError, EngineResult};
use crate::core::lifecycle::{Lifecycle, LifecycleState};
use crate::render::backend::{BindTarget, GraphicsDevice, NativeHandle, ObjectKind};

/// Acquire/release contract for GPU-backed objects
pub trait GpuResource {
    /// Create the native object. Fails with `Lifecycle` if called twice.
    fn init(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()>;

    /// Delete the native object. Fails with `Lifecycle` unless initialized.
    fn destroy(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()>;

    /// Whether a live native handle is held
    fn is_created(&self) -> bool;
}

/// Objects that can be made the implicit target of device calls
pub trait Bindable {
    /// Make this object current for its target
    fn bind(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()>;

    /// Clear this object's target
    fn unbind(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()>;

    /// Whether this object is currently bound
    fn is_bound(&self, device: &dyn GraphicsDevice) -> bool;
}

/// Native handle plus lifecycle state; the shared core of every resource object
#[derive(Debug)]
pub struct GpuObject {
    label: &'static str,
    kind: ObjectKind,
    target: BindTarget,
    handle: Option<NativeHandle>,
    lifecycle: Lifecycle,
}

impl GpuObject {
    pub(crate) const fn new(label: &'static str, kind: ObjectKind, target: BindTarget) -> Self {
        Self {
            label,
            kind,
            target,
            handle: None,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Name used in errors and logs
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Binding point this object uses
    pub const fn target(&self) -> BindTarget {
        self.target
    }

    /// Lifecycle state
    pub const fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Native handle, `None` before init, after destroy, or once moved from
    pub const fn handle(&self) -> Option<NativeHandle> {
        self.handle
    }

    pub(crate) fn create(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        let mut next = self.lifecycle.clone();
        next.begin_init(self.label)?;
        let handle = device.create_object(self.kind)?;
        self.handle = Some(handle);
        self.lifecycle = next;
        Ok(())
    }

    pub(crate) fn release(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.lifecycle.require_live(self.label, "destroy")?;
        if let Some(handle) = self.handle {
            device.delete_object(handle)?;
        }
        self.handle = None;
        self.lifecycle.begin_destroy(self.label)
    }

    /// Handle of a live object; `operation` names the rejected call otherwise
    pub(crate) fn live_handle(&self, operation: &str) -> EngineResult<NativeHandle> {
        self.lifecycle.require_live(self.label, operation)?;
        self.handle.ok_or_else(|| {
            EngineError::lifecycle(format!("{operation} called on moved-from {}", self.label))
        })
    }

    /// Handle of a live object that must also be bound (checked in debug builds)
    pub(crate) fn bound_handle(&self, device: &dyn GraphicsDevice, operation: &str) -> EngineResult<NativeHandle> {
        let handle = self.live_handle(operation)?;
        if cfg!(debug_assertions) && device.bound(self.target) != Some(handle) {
            return Err(EngineError::lifecycle(format!(
                "{operation} requires {} to be bound to {:?}",
                self.label, self.target
            )));
        }
        Ok(handle)
    }

    pub(crate) fn bind(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        let handle = self.live_handle("bind")?;
        device.bind(self.target, Some(handle))
    }

    pub(crate) fn unbind(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.live_handle("unbind")?;
        device.bind(self.target, None)
    }

    pub(crate) fn is_bound(&self, device: &dyn GraphicsDevice) -> bool {
        self.handle.is_some() && device.bound(self.target) == self.handle
    }

    pub(crate) fn is_created(&self) -> bool {
        self.handle.is_some() && self.lifecycle.is_initialized()
    }

    /// Move the handle into a new object, leaving `self` inert
    pub(crate) fn transfer(&mut self) -> Self {
        Self {
            label: self.label,
            kind: self.kind,
            target: self.target,
            handle: self.handle.take(),
            lifecycle: std::mem::replace(&mut self.lifecycle, Lifecycle::inert()),
        }
    }
}

impl Drop for GpuObject {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::warn!(
                "{} dropped while still holding {:?}; destroy() was never called",
                self.label,
                handle
            );
        }
    }
}
