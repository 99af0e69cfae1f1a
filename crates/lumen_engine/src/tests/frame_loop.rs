//! Frame loop scenarios: the system driver running the graphics module on
//! the headless backend

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::core::config::{FrameLoopConfig, RendererConfig};
use crate::core::error::{EngineError, EngineResult, ErrorKind};
use crate::core::report::ErrorReporter;
use crate::foundation::math::Transformation;
use crate::render::backend::ObjectKind;
use crate::render::headless::{HeadlessDevice, HeadlessSurface};
use crate::render::renderer::StandardRenderer;
use crate::scene::{Capabilities, EaseFunction, EaseSettings, Entity, EntityKind, FpsComponent};
use crate::system::driver::tests::ScriptedModule;
use crate::system::{GraphicsModule, System, SystemFlags};
use approx::assert_relative_eq;

#[cfg(test)]
mod tests {
    use super::*;

    type Headless = StandardRenderer<HeadlessDevice, HeadlessSurface>;

    #[derive(Default, Clone)]
    struct SharedReporter {
        reports: Rc<RefCell<Vec<(ErrorKind, String)>>>,
    }

    impl ErrorReporter for SharedReporter {
        fn report(&mut self, kind: ErrorKind, message: &str) {
            self.reports.borrow_mut().push((kind, message.to_string()));
        }

        fn verbose(&self) -> bool {
            true
        }
    }

    fn small() -> RendererConfig {
        RendererConfig::default().with_size(64, 64)
    }

    fn unthrottled(max_frames: u64) -> FrameLoopConfig {
        FrameLoopConfig {
            updates_per_second: 0,
            max_frames: Some(max_frames),
        }
    }

    fn sliding_quads(root: &mut Entity) -> EngineResult<()> {
        let settings = EaseSettings::default()
            .with_ease(EaseFunction::Linear)
            .with_duration(Duration::from_millis(100));
        for (i, target) in [0.5_f32, -0.5].into_iter().enumerate() {
            let mut quad = Entity::quad().with_name(format!("quad{i}"));
            quad.tween(
                Transformation::identity().with_translation(target, 0.0, 0.0),
                settings,
            )?;
            root.add_child(quad)?;
        }
        Ok(())
    }

    #[test]
    fn test_tweens_reach_destination_over_frames() {
        let mut system = System::new();
        system.add_module(GraphicsModule::headless(&small()).with_scene(sliding_quads));
        system.init().unwrap();
        for _ in 0..10 {
            system.update(0.02).unwrap();
        }

        let graphics = system.module::<GraphicsModule>("graphics").unwrap();
        let xs: Vec<f32> = graphics
            .root()
            .children()
            .iter()
            .map(|quad| quad.transformation().translation.x)
            .collect();
        assert_relative_eq!(xs[0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(xs[1], -0.5, epsilon = 1e-6);
        assert!(graphics.root().children().iter().all(|quad| quad.component_count() == 0));

        let renderer = graphics.renderer_as::<Headless>().unwrap();
        assert_eq!(renderer.frames(), 10);
        assert_eq!(renderer.device().draw_calls().count(), 2);
        assert_eq!(renderer.device().total_draws(), 20);
    }

    #[test]
    fn test_run_stops_at_frame_cap_and_destroys() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut system = System::new().with_frame_loop(unthrottled(3));
        system.add_module(ScriptedModule::new("input", &log));
        system.add_module(GraphicsModule::headless(&small()).with_scene(sliding_quads));

        system.run().unwrap();

        assert_eq!(system.frame(), 3);
        assert!(system.flags().contains(SystemFlags::DESTROYED));
        let graphics = system.module::<GraphicsModule>("graphics").unwrap();
        assert!(graphics.renderer().is_none());
        assert_eq!(
            *log.borrow(),
            vec!["input init", "input update 0", "input update 1", "input update 2", "input destroy"]
        );
    }

    #[test]
    fn test_module_can_stop_the_loop() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scripted = ScriptedModule::new("game", &log);
        scripted.stop_at_frame = Some(1);
        let mut system = System::new().with_frame_loop(unthrottled(100));
        system.add_module(GraphicsModule::headless(&small()));
        system.add_module(scripted);

        system.run().unwrap();
        assert_eq!(system.frame(), 2);
    }

    #[test]
    fn test_missing_protocol_is_reported_and_loop_torn_down() {
        let reporter = SharedReporter::default();
        let reports = Rc::clone(&reporter.reports);
        let mut system = System::new()
            .with_frame_loop(unthrottled(10))
            .with_reporter(reporter);
        system.add_module(GraphicsModule::headless(&small()).with_scene(|root| {
            root.add_child(Entity::new(EntityKind::new("sprite")).with_capabilities(Capabilities::DRAWABLE))?;
            Ok(())
        }));

        let err = system.run().unwrap_err();
        assert!(matches!(err, EngineError::DependencyNotFound(_)));
        assert!(system.flags().contains(SystemFlags::DESTROYED));

        let reports = reports.borrow();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, ErrorKind::DependencyNotFound);
        assert!(reports[0].1.contains("modules: [graphics]"));
        assert!(reports[0].1.contains("frame: 0"));
    }

    #[test]
    fn test_empty_system_run_fails() {
        let mut system = System::new().with_frame_loop(unthrottled(1));
        assert!(matches!(system.run().unwrap_err(), EngineError::DependencyNotFound(_)));
    }

    #[test]
    fn test_second_run_restarts_scene_from_builder() {
        let mut system = System::new().with_frame_loop(unthrottled(10));
        system.add_module(GraphicsModule::headless(&small()).with_scene(sliding_quads));
        system.run().unwrap();
        assert!(system.flags().contains(SystemFlags::DESTROYED));

        system.init().unwrap();
        assert_eq!(system.frame(), 0);
        let graphics = system.module::<GraphicsModule>("graphics").unwrap();
        assert_eq!(graphics.root().children().len(), 2);
        assert!(graphics
            .root()
            .children()
            .iter()
            .all(|quad| quad.transformation().translation.x == 0.0 && quad.component_count() == 1));
        let renderer = graphics.renderer_as::<Headless>().unwrap();
        assert_eq!(renderer.frames(), 0);
        assert_eq!(renderer.device().live_objects_of(ObjectKind::Buffer), 0);

        system.update(0.02).unwrap();
        assert_eq!(system.frame(), 1);
    }

    #[test]
    fn test_reset_empties_the_system() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut system = System::new();
        system.add_module(ScriptedModule::new("input", &log));
        system.add_module(GraphicsModule::headless(&small()).with_scene(sliding_quads));
        system.init().unwrap();
        system.update(0.02).unwrap();

        system.reset().unwrap();
        assert!(system.is_empty());
        assert_eq!(system.flags(), SystemFlags::empty());
        assert_eq!(system.frame(), 0);
        assert_eq!(log.borrow().last().unwrap(), "input destroy");
        assert!(matches!(system.init().unwrap_err(), EngineError::DependencyNotFound(_)));

        system.add_module(GraphicsModule::headless(&small()).with_scene(sliding_quads));
        system.init().unwrap();
        system.update(0.02).unwrap();
        let graphics = system.module::<GraphicsModule>("graphics").unwrap();
        assert_eq!(graphics.renderer_as::<Headless>().unwrap().frames(), 1);
    }

    #[test]
    fn test_long_run_keeps_headless_log_bounded() {
        let mut system = System::new();
        system.add_module(GraphicsModule::headless(&small()).with_scene(sliding_quads));
        system.init().unwrap();
        for _ in 0..10 {
            system.update(0.016).unwrap();
        }
        let settled = {
            let graphics = system.module::<GraphicsModule>("graphics").unwrap();
            graphics.renderer_as::<Headless>().unwrap().device().commands().len()
        };

        for _ in 0..1000 {
            system.update(0.016).unwrap();
        }
        let graphics = system.module::<GraphicsModule>("graphics").unwrap();
        let device = graphics.renderer_as::<Headless>().unwrap().device();
        assert_eq!(device.commands().len(), settled);
        assert_eq!(device.total_draws(), 2 * 1010);
    }

    #[test]
    fn test_scene_edits_between_frames_are_drawn() {
        let mut system = System::new();
        system.add_module(GraphicsModule::headless(&small()));
        system.init().unwrap();
        system.update(0.016).unwrap();

        let graphics = system.module_mut::<GraphicsModule>("graphics").unwrap();
        let id = graphics.root_mut().add_child(Entity::quad()).unwrap();
        assert!(graphics.root().children().find(id).unwrap().is_initialized());
        system.update(0.016).unwrap();

        let graphics = system.module_mut::<GraphicsModule>("graphics").unwrap();
        graphics.root_mut().remove_child(id).unwrap();
        system.update(0.016).unwrap();

        let graphics = system.module::<GraphicsModule>("graphics").unwrap();
        let renderer = graphics.renderer_as::<Headless>().unwrap();
        assert_eq!(renderer.device().draw_calls().count(), 0);
        assert_eq!(renderer.device().total_draws(), 1);
        assert_eq!(renderer.protocols().set_up_count(EntityKind::QUAD), 0);
    }

    #[test]
    fn test_fps_counter_ticks_with_the_loop() {
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&ticks);
        let mut system = System::new();
        system.add_module(GraphicsModule::headless(&small()).with_scene(move |root| {
            let sink = Rc::clone(&sink);
            root.add_component(FpsComponent::new().on_tick(move |_, stats| {
                sink.borrow_mut().push(stats.frames);
            }))
        }));
        system.init().unwrap();
        for _ in 0..25 {
            system.update(0.1).unwrap();
        }

        // the root is not drawable but still renders its components
        let ticks = ticks.borrow();
        assert_eq!(ticks.len(), 2);
        assert!(ticks.iter().all(|&frames| frames >= 9));
    }

    #[test]
    fn test_late_module_needs_explicit_init() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut system = System::new();
        system.add_module(ScriptedModule::new("early", &log));
        system.init().unwrap();

        let late = system.add_module(ScriptedModule::new("late", &log));
        assert!(matches!(system.update(0.0).unwrap_err(), EngineError::Lifecycle(_)));
        system.init_module(late).unwrap();
        system.update(0.0).unwrap();
        assert!(log.borrow().contains(&"late update 0".to_string()));
    }
}
