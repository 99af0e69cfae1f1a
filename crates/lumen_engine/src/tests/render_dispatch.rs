//! Render dispatch scenarios on the headless backend

use crate::core::config::RendererConfig;
use crate::core::error::EngineError;
use crate::foundation::color::Color;
use crate::foundation::math::Transformation;
use crate::render::backend::BufferUsage;
use crate::render::headless::{DeviceCommand, HeadlessDevice, HeadlessSurface};
use crate::render::protocols::{EntityUniforms, QuadProtocol};
use crate::render::renderer::{Renderer, StandardRenderer};
use crate::render::resources::{Bindable, Buffer, GpuResource};
use crate::scene::{Capabilities, Entity, EntityKind};

#[cfg(test)]
mod tests {
    use super::*;

    type Headless = StandardRenderer<HeadlessDevice, HeadlessSurface>;

    fn renderer() -> Headless {
        let config = RendererConfig::default().with_size(320, 240);
        let mut renderer = StandardRenderer::new(HeadlessDevice::new(), HeadlessSurface::new(320, 240), &config)
            .with_protocol(EntityKind::QUAD, QuadProtocol::new())
            .unwrap();
        renderer.set_up().unwrap();
        renderer
    }

    fn quad_at(x: f32, depth: i32) -> Entity {
        Entity::quad()
            .with_depth(depth)
            .with_transformation(Transformation::identity().with_translation(x, 0.0, 0.0))
    }

    /// World x translation of every draw, in submission order
    fn drawn_x(renderer: &Headless) -> Vec<f32> {
        let device = renderer.device();
        device
            .draw_calls()
            .filter_map(|draw| match draw {
                DeviceCommand::Draw {
                    uniform_slot0: Some(buffer),
                    ..
                } => device.buffer_contents(*buffer),
                _ => None,
            })
            .map(|bytes| bytemuck::pod_read_unaligned::<EntityUniforms>(bytes).world[3][0])
            .collect()
    }

    #[test]
    fn test_deeper_entity_drawn_after_shallower() {
        let mut root = Entity::group();
        root.add_child(quad_at(1.0, 1).with_name("B")).unwrap();
        root.add_child(quad_at(-1.0, 0).with_name("A")).unwrap();
        root.init().unwrap();
        root.clean().unwrap();

        let mut renderer = renderer();
        renderer.render_frame(&mut root).unwrap();
        assert_eq!(drawn_x(&renderer), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_equal_depth_keeps_traversal_order() {
        let mut root = Entity::group();
        let mut nested = quad_at(1.0, 0);
        nested.add_child(quad_at(2.0, 0)).unwrap();
        root.add_child(nested).unwrap();
        root.add_child(quad_at(3.0, 0)).unwrap();
        root.init().unwrap();
        root.clean().unwrap();

        let mut renderer = renderer();
        renderer.render_frame(&mut root).unwrap();
        // child world = parent translation + own translation
        assert_eq!(drawn_x(&renderer), vec![1.0, 3.0, 3.0]);
    }

    #[test]
    fn test_unregistered_kind_is_dependency_not_found() {
        let mut root = Entity::group();
        root.add_child(Entity::new(EntityKind::new("sprite")).with_capabilities(Capabilities::DRAWABLE))
            .unwrap();
        root.init().unwrap();
        root.clean().unwrap();

        let mut renderer = renderer();
        let err = renderer.render_frame(&mut root).unwrap_err();
        assert!(matches!(err, EngineError::DependencyNotFound(_)));
    }

    #[test]
    fn test_groups_are_never_dispatched() {
        let mut root = Entity::group();
        root.add_child(Entity::group()).unwrap();
        root.init().unwrap();
        root.clean().unwrap();

        let mut renderer = renderer();
        renderer.render_frame(&mut root).unwrap();
        assert_eq!(renderer.device().draw_calls().count(), 0);
        assert_eq!(renderer.surface().presented_frames(), 1);
    }

    #[test]
    fn test_refresh_color_used_on_clear() {
        let mut root = Entity::group();
        root.init().unwrap();
        let mut renderer = renderer();
        renderer.set_refresh_color(Color::BLUE);
        renderer.render_frame(&mut root).unwrap();
        assert_eq!(renderer.device().current_clear_color(), Color::BLUE);
    }

    #[test]
    fn test_material_reaches_uniforms() {
        let mut root = Entity::group();
        root.add_child(Entity::quad().with_color(Color::RED)).unwrap();
        root.init().unwrap();
        root.clean().unwrap();

        let mut renderer = renderer();
        renderer.render_frame(&mut root).unwrap();
        let device = renderer.device();
        let Some(DeviceCommand::Draw {
            uniform_slot0: Some(buffer),
            ..
        }) = device.draw_calls().next()
        else {
            panic!("expected one draw");
        };
        let uniforms: EntityUniforms = bytemuck::pod_read_unaligned(device.buffer_contents(*buffer).unwrap());
        assert_eq!(uniforms.color, Color::RED.to_array());
        assert_eq!(uniforms.opacity, 1.0);
    }

    #[test]
    fn test_gpu_misuse_is_lifecycle_error() {
        let mut device = HeadlessDevice::new();
        let mut buffer = Buffer::vertex(BufferUsage::StaticDraw);

        assert!(matches!(buffer.bind(&mut device).unwrap_err(), EngineError::Lifecycle(_)));

        buffer.init(&mut device).unwrap();
        if cfg!(debug_assertions) {
            assert!(matches!(
                buffer.set_data(&mut device, &[1.0_f32]).unwrap_err(),
                EngineError::Lifecycle(_)
            ));
        }

        buffer.destroy(&mut device).unwrap();
        assert!(matches!(buffer.bind(&mut device).unwrap_err(), EngineError::Lifecycle(_)));
        assert!(matches!(buffer.destroy(&mut device).unwrap_err(), EngineError::Lifecycle(_)));
    }

    #[test]
    fn test_transfer_moves_ownership() {
        let mut device = HeadlessDevice::new();
        let mut original = Buffer::uniform(BufferUsage::DynamicDraw);
        original.init(&mut device).unwrap();
        let handle = original.handle();

        let mut moved = original.transfer();
        assert_eq!(moved.handle(), handle);
        assert!(original.handle().is_none());
        assert!(matches!(original.bind(&mut device).unwrap_err(), EngineError::Lifecycle(_)));

        moved.destroy(&mut device).unwrap();
        assert_eq!(device.live_objects(), 0);
    }
}
