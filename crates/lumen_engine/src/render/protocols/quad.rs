//! Colored quad protocol
//!
//! Shared state: one indexed unit quad `[-1, 1]²`, one program and a 1x1
//! white texture. Per entity: a uniform buffer holding the world matrix and
//! tint, rewritten every frame the entity is drawn.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::core::error::{EngineError, EngineResult};
use crate::foundation::color::Color;
use crate::foundation::math::Mat4;
use crate::render::backend::{BufferUsage, GraphicsDevice, Topology, UniformValue, VertexAttribute};
use crate::render::protocol::RenderProtocol;
use crate::render::queue::RenderItem;
use crate::render::resources::{Bindable, Buffer, GpuResource, ShaderProgram, Texture, VertexArray};
use crate::scene::entity::EntityId;

const VERTEX_SHADER: &str = r#"#version 330 core
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_uv;

layout(std140) uniform EntityData {
    mat4 u_world;
    vec4 u_color;
    float u_opacity;
};
uniform mat4 u_projection;

out vec2 v_uv;

void main() {
    v_uv = a_uv;
    gl_Position = u_projection * u_world * vec4(a_position, 0.0, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 330 core
layout(std140) uniform EntityData {
    mat4 u_world;
    vec4 u_color;
    float u_opacity;
};
uniform sampler2D u_texture;

in vec2 v_uv;
out vec4 frag_color;

void main() {
    vec4 texel = texture(u_texture, v_uv) * u_color;
    frag_color = vec4(texel.rgb, texel.a * u_opacity);
}
"#;

const ENTITY_BLOCK: &str = "EntityData";
const ENTITY_SLOT: u32 = 0;

/// Vertex of the shared quad
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct QuadVertex {
    /// Position in the unit quad
    pub position: [f32; 2],
    /// Texture coordinate
    pub uv: [f32; 2],
}

/// `EntityData` uniform block, std140 layout
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct EntityUniforms {
    /// Column-major world matrix
    pub world: [[f32; 4]; 4],
    /// Tint
    pub color: [f32; 4],
    /// Opacity multiplier
    pub opacity: f32,
    _padding: [f32; 3],
}

impl EntityUniforms {
    /// Uniforms for one queued item
    pub fn from_item(item: &RenderItem) -> Self {
        Self {
            world: item.world.into(),
            color: item.material.color.to_array(),
            opacity: item.material.opacity,
            _padding: [0.0; 3],
        }
    }
}

const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    QuadVertex { position: [1.0, -1.0], uv: [1.0, 1.0] },
    QuadVertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
    QuadVertex { position: [-1.0, 1.0], uv: [0.0, 0.0] },
];

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Draws [`EntityKind::QUAD`](crate::scene::EntityKind::QUAD) entities
#[derive(Debug)]
pub struct QuadProtocol {
    mesh: VertexArray,
    program: Option<ShaderProgram>,
    texture: Option<Texture>,
    projection: Mat4,
    uniforms: HashMap<EntityId, Buffer>,
}

impl Default for QuadProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadProtocol {
    /// Protocol with no GPU state yet
    pub fn new() -> Self {
        Self {
            mesh: VertexArray::new(Topology::Triangles),
            program: None,
            texture: None,
            projection: Mat4::identity(),
            uniforms: HashMap::new(),
        }
    }

    /// Current projection; keeps the unit square square at any aspect ratio
    pub const fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Entities holding a uniform buffer
    pub fn entity_count(&self) -> usize {
        self.uniforms.len()
    }

    fn program(&mut self) -> EngineResult<&mut ShaderProgram> {
        self.program
            .as_mut()
            .ok_or_else(|| EngineError::lifecycle("QuadProtocol used before init"))
    }
}

impl RenderProtocol for QuadProtocol {
    fn name(&self) -> &str {
        "QuadProtocol"
    }

    fn init(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        let mut program = ShaderProgram::from_sources(device, VERTEX_SHADER, FRAGMENT_SHADER)?;
        program.bind(device)?;
        program.bind_uniform_block(device, ENTITY_BLOCK, ENTITY_SLOT)?;
        program.set_uniform(device, "u_texture", UniformValue::Int(0))?;
        program.unbind(device)?;
        self.program = Some(program);

        self.texture = Some(Texture::solid_color(device, Color::WHITE)?);

        let stride = std::mem::size_of::<QuadVertex>();
        self.mesh.init(device)?;
        self.mesh.bind(device)?;
        self.mesh.load_vertices(
            device,
            &QUAD_VERTICES,
            &[
                VertexAttribute { location: 0, components: 2, offset: 0, stride },
                VertexAttribute { location: 1, components: 2, offset: 8, stride },
            ],
        )?;
        self.mesh.load_indices(device, &QUAD_INDICES)?;
        self.mesh.unbind(device)
    }

    fn set_up(&mut self, device: &mut dyn GraphicsDevice, item: &RenderItem) -> EngineResult<()> {
        let mut buffer = Buffer::uniform(BufferUsage::StreamDraw);
        buffer.init(device)?;
        buffer.bind(device)?;
        buffer.set_data(device, &[EntityUniforms::from_item(item)])?;
        buffer.unbind(device)?;
        self.uniforms.insert(item.entity, buffer);
        Ok(())
    }

    fn render(&mut self, device: &mut dyn GraphicsDevice, item: &RenderItem) -> EngineResult<()> {
        let mut projection = [0.0_f32; 16];
        projection.copy_from_slice(self.projection.as_slice());

        let buffer = self.uniforms.get_mut(&item.entity).ok_or_else(|| {
            EngineError::DependencyNotFound(format!("entity {} was not set up", item.entity))
        })?;
        buffer.bind(device)?;
        buffer.set_data_range(device, 0, &[EntityUniforms::from_item(item)])?;
        buffer.unbind(device)?;
        buffer.bind_to_slot(device, ENTITY_SLOT)?;

        if let Some(texture) = &self.texture {
            texture.bind_to_unit(device, 0)?;
        }

        let program = self.program()?;
        program.bind(device)?;
        program.set_uniform(device, "u_projection", UniformValue::Mat4(projection))?;
        self.mesh.bind(device)?;
        self.mesh.draw(device)?;
        self.mesh.unbind(device)?;
        self.program()?.unbind(device)
    }

    fn resize(&mut self, _device: &mut dyn GraphicsDevice, width: u32, height: u32) -> EngineResult<()> {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        self.projection = Mat4::new_orthographic(-aspect, aspect, -1.0, 1.0, -1.0, 1.0);
        Ok(())
    }

    fn release(&mut self, device: &mut dyn GraphicsDevice, entity: EntityId) -> EngineResult<()> {
        if let Some(mut buffer) = self.uniforms.remove(&entity) {
            buffer.destroy(device)?;
        }
        Ok(())
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) -> EngineResult<()> {
        for (_, mut buffer) in self.uniforms.drain() {
            buffer.destroy(device)?;
        }
        if let Some(mut texture) = self.texture.take() {
            texture.destroy(device)?;
        }
        if let Some(mut program) = self.program.take() {
            program.destroy(device)?;
        }
        if self.mesh.is_created() {
            self.mesh.destroy(device)?;
        }
        self.mesh = VertexArray::new(Topology::Triangles);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Rect;
    use crate::render::backend::ObjectKind;
    use crate::render::headless::{DeviceCommand, HeadlessDevice};
    use crate::scene::entity::{EntityKind, Material};

    fn item() -> RenderItem {
        RenderItem {
            entity: EntityId::next(),
            kind: EntityKind::QUAD,
            depth: 0,
            world: Mat4::new_translation(&crate::foundation::math::Vec3::new(0.5, 0.0, 0.0)),
            material: Material::default(),
            bounds: Rect::default(),
        }
    }

    #[test]
    fn test_uniform_layout_is_std140_sized() {
        assert_eq!(std::mem::size_of::<EntityUniforms>(), 96);
    }

    #[test]
    fn test_draws_one_indexed_quad_per_entity() {
        let mut device = HeadlessDevice::new();
        let mut protocol = QuadProtocol::new();
        protocol.init(&mut device).unwrap();

        let quad = item();
        protocol.set_up(&mut device, &quad).unwrap();
        protocol.render(&mut device, &quad).unwrap();

        let draws: Vec<_> = device.draw_calls().cloned().collect();
        assert_eq!(draws.len(), 1);
        let DeviceCommand::Draw { count, indexed, uniform_slot0, .. } = &draws[0] else {
            panic!("expected a draw");
        };
        assert_eq!(*count, 6);
        assert!(*indexed);

        let buffer = uniform_slot0.unwrap();
        let bytes = device.buffer_contents(buffer).unwrap();
        let uniforms: EntityUniforms = bytemuck::pod_read_unaligned(bytes);
        assert_eq!(uniforms.world[3][0], 0.5);
    }

    #[test]
    fn test_release_and_destroy_free_everything() {
        let mut device = HeadlessDevice::new();
        let mut protocol = QuadProtocol::new();
        protocol.init(&mut device).unwrap();
        let quad = item();
        protocol.set_up(&mut device, &quad).unwrap();
        assert_eq!(protocol.entity_count(), 1);

        protocol.release(&mut device, quad.entity).unwrap();
        assert_eq!(protocol.entity_count(), 0);

        protocol.destroy(&mut device).unwrap();
        assert_eq!(device.live_objects(), 0);
        assert_eq!(device.live_objects_of(ObjectKind::Program), 0);
    }

    #[test]
    fn test_resize_keeps_aspect() {
        let mut device = HeadlessDevice::new();
        let mut protocol = QuadProtocol::new();
        protocol.resize(&mut device, 200, 100).unwrap();
        assert_eq!(protocol.projection()[(0, 0)], 0.5);
        assert_eq!(protocol.projection()[(1, 1)], 1.0);
    }
}
