//! Vertex arrays: attribute layout plus owned vertex and index buffers

use bytemuck::Pod;

use super::{Bindable, Buffer, GpuObject, GpuResource};
use crate::core::error::EngineResult;
use crate::render::backend::{
    BindTarget, BufferUsage, GraphicsDevice, NativeHandle, ObjectKind, Topology, VertexAttribute,
};

/// Vertex array owning one vertex buffer and one index buffer
#[derive(Debug)]
pub struct VertexArray {
    object: GpuObject,
    vertices: Buffer,
    indices: Buffer,
    vertex_count: usize,
    index_count: usize,
    topology: Topology,
}

impl VertexArray {
    /// Uninitialized vertex array drawing `topology`
    pub fn new(topology: Topology) -> Self {
        Self {
            object: GpuObject::new("VertexArray", ObjectKind::VertexArray, BindTarget::VertexArray),
            vertices: Buffer::vertex(BufferUsage::StaticDraw),
            indices: Buffer::index(BufferUsage::StaticDraw),
            vertex_count: 0,
            index_count: 0,
            topology,
        }
    }

    /// Vertices loaded
    pub const fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Indices loaded
    pub const fn index_count(&self) -> usize {
        self.index_count
    }

    /// Native handle while live
    pub const fn handle(&self) -> Option<NativeHandle> {
        self.object.handle()
    }

    /// Upload vertices and describe their layout. The vertex array must be bound.
    pub fn load_vertices<T: Pod>(
        &mut self,
        device: &mut dyn GraphicsDevice,
        vertices: &[T],
        attributes: &[VertexAttribute],
    ) -> EngineResult<()> {
        self.object.bound_handle(device, "load_vertices")?;
        self.vertices.bind(device)?;
        self.vertices.set_data(device, vertices)?;
        for attribute in attributes {
            device.vertex_attribute(attribute)?;
        }
        self.vertices.unbind(device)?;
        self.vertex_count = vertices.len();
        Ok(())
    }

    /// Upload indices. The vertex array must be bound; the index buffer stays
    /// attached to it.
    pub fn load_indices(&mut self, device: &mut dyn GraphicsDevice, indices: &[u32]) -> EngineResult<()> {
        self.object.bound_handle(device, "load_indices")?;
        self.indices.bind(device)?;
        self.indices.set_data(device, indices)?;
        self.index_count = indices.len();
        Ok(())
    }

    /// Draw everything loaded; indexed when indices were loaded. The vertex
    /// array must be bound.
    pub fn draw(&self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.bound_handle(device, "draw")?;
        if self.index_count > 0 {
            device.draw_elements(self.topology, self.index_count)
        } else {
            device.draw_arrays(self.topology, 0, self.vertex_count)
        }
    }
}

impl GpuResource for VertexArray {
    fn init(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.create(device)?;
        self.vertices.init(device)?;
        self.indices.init(device)
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        self.object.release(device)?;
        if self.indices.is_created() {
            self.indices.destroy(device)?;
        }
        if self.vertices.is_created() {
            self.vertices.destroy(device)?;
        }
        self.vertex_count = 0;
        self.index_count = 0;
        Ok(())
    }

    fn is_created(&self) -> bool {
        self.object.is_created()
    }
}

impl Bindable for VertexArray {
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
