//! Buffer objects for vertex, index and uniform data

use bytemuck::Pod;

use super::{Bindable, GpuObject, GpuResource};
use crate::core::error::{EngineError, EngineResult};
use crate::render::backend::{BindTarget, BufferUsage, GraphicsDevice, NativeHandle, ObjectKind};

/// Buffer bound to one of the buffer targets
#[derive(Debug)]
pub struct Buffer {
    object: GpuObject,
    usage: BufferUsage,
    size: usize,
}

impl Buffer {
    fn with_target(target: BindTarget, usage: BufferUsage) -> Self {
        Self {
            object: GpuObject::new("Buffer", ObjectKind::Buffer, target),
            usage,
            size: 0,
        }
    }

    /// Vertex buffer
    pub fn vertex(usage: BufferUsage) -> Self {
        Self::with_target(BindTarget::ArrayBuffer, usage)
    }

    /// Index buffer
    pub fn index(usage: BufferUsage) -> Self {
        Self::with_target(BindTarget::ElementArrayBuffer, usage)
    }

    /// Uniform buffer
    pub fn uniform(usage: BufferUsage) -> Self {
        Self::with_target(BindTarget::UniformBuffer, usage)
    }

    /// Bytes of storage last allocated by [`Buffer::set_data`]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Binding point
    pub const fn target(&self) -> BindTarget {
        self.object.target()
    }

    /// Native handle while live
    pub const fn handle(&self) -> Option<NativeHandle> {
        self.object.handle()
    }

    /// Replace the whole storage with `data`. The buffer must be bound.
    pub fn set_data<T: Pod>(&mut self, device: &mut dyn GraphicsDevice, data: &[T]) -> EngineResult<()> {
        self.object.bound_handle(device, "set_data")?;
        let bytes: &[u8] = bytemuck::cast_slice(data);
        device.buffer_data(self.target(), bytes, self.usage)?;
        self.size = bytes.len();
        Ok(())
    }

    /// Overwrite a byte range starting at `offset`. The buffer must be bound
    /// and the range must fit the current storage.
    pub fn set_data_range<T: Pod>(
        &mut self,
        device: &mut dyn GraphicsDevice,
        offset: usize,
        data: &[T],
    ) -> EngineResult<()> {
        self.object.bound_handle(device, "set_data_range")?;
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let end = offset + bytes.len();
        if end > self.size {
            return Err(EngineError::IndexOutOfBounds {
                index: end,
                len: self.size,
            });
        }
        device.buffer_sub_data(self.target(), offset, bytes)
    }

    /// Attach this uniform buffer to a uniform block slot
    pub fn bind_to_slot(&self, device: &mut dyn GraphicsDevice, slot: u32) -> EngineResult<()> {
        let handle = self.object.live_handle("bind_to_slot")?;
        device.bind_buffer_base(slot, Some(handle))
    }

    /// Move the native buffer out, leaving `self` inert
    pub fn transfer(&mut self) -> Self {
        Self {
            object: self.object.transfer(),
            usage: self.usage,
            size: std::mem::take(&mut self.size),
        }
    }
}

impl GpuResource for Buffer {
    fn init(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.create(device)
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.release(device)?;
        self.size = 0;
        Ok(())
    }

    fn is_created(&self) -> bool {
        self.object.is_created()
    }
}

impl Bindable for Buffer {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessDevice;

    #[test]
    fn test_set_data_requires_bind_in_debug() {
        let mut device = HeadlessDevice::new();
        let mut buffer = Buffer::vertex(BufferUsage::StaticDraw);
        buffer.init(&mut device).unwrap();
        if cfg!(debug_assertions) {
            let err = buffer.set_data(&mut device, &[1.0_f32, 2.0]).unwrap_err();
            assert!(matches!(err, EngineError::Lifecycle(_)));
        }
        buffer.bind(&mut device).unwrap();
        buffer.set_data(&mut device, &[1.0_f32, 2.0]).unwrap();
        assert_eq!(buffer.size(), 8);
        buffer.destroy(&mut device).unwrap();
    }

    #[test]
    fn test_set_data_range_bounds() {
        let mut device = HeadlessDevice::new();
        let mut buffer = Buffer::uniform(BufferUsage::DynamicDraw);
        buffer.init(&mut device).unwrap();
        buffer.bind(&mut device).unwrap();
        buffer.set_data(&mut device, &[0_u32; 4]).unwrap();
        buffer.set_data_range(&mut device, 4, &[7_u32]).unwrap();

        let handle = buffer.handle().unwrap();
        assert_eq!(&device.buffer_contents(handle).unwrap()[4..8], &7_u32.to_ne_bytes());

        let err = buffer.set_data_range(&mut device, 12, &[1_u32, 2]).unwrap_err();
        assert!(matches!(err, EngineError::IndexOutOfBounds { index: 20, len: 16 }));
        buffer.destroy(&mut device).unwrap();
    }

    #[test]
    fn test_set_data_after_destroy_fails() {
        let mut device = HeadlessDevice::new();
        let mut buffer = Buffer::index(BufferUsage::StaticDraw);
        buffer.init(&mut device).unwrap();
        buffer.destroy(&mut device).unwrap();
        assert!(matches!(
            buffer.set_data(&mut device, &[0_u32, 1, 2]),
            Err(EngineError::Lifecycle(_))
        ));
        assert!(matches!(buffer.destroy(&mut device), Err(EngineError::Lifecycle(_))));
    }

    #[test]
    fn test_uniform_slot() {
        let mut device = HeadlessDevice::new();
        let mut buffer = Buffer::uniform(BufferUsage::DynamicDraw);
        assert!(buffer.bind_to_slot(&mut device, 0).is_err());
        buffer.init(&mut device).unwrap();
        buffer.bind_to_slot(&mut device, 0).unwrap();
        buffer.destroy(&mut device).unwrap();
    }
}
