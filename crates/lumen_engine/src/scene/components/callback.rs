use std::any::Any;

use crate::core::error::EngineResult;
use crate::scene::component::Component;
use crate::scene::entity::Entity;

type Hook = Box<dyn FnMut(&mut Entity) -> EngineResult<()>>;
type UpdateHook = Box<dyn FnMut(&mut Entity, f32) -> EngineResult<()>>;

/// Component whose hooks are closures
///
/// ```ignore
/// entity.add_component(
///     CallbackComponent::new().on_update(|owner, dt| {
///         owner.transformation_mut().rotate(0.0, 0.0, dt);
///         Ok(())
///     }),
/// )?;
/// ```
#[derive(Default)]
pub struct CallbackComponent {
    init: Option<Hook>,
    update: Option<UpdateHook>,
    render: Option<Hook>,
    clean: Option<Hook>,
    destroy: Option<Hook>,
    done: bool,
}

impl CallbackComponent {
    /// Component with no hooks
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` on init
    pub fn on_init(mut self, hook: impl FnMut(&mut Entity) -> EngineResult<()> + 'static) -> Self {
        self.init = Some(Box::new(hook));
        self
    }

    /// Run `hook` on every update
    pub fn on_update(
        mut self,
        hook: impl FnMut(&mut Entity, f32) -> EngineResult<()> + 'static,
    ) -> Self {
        self.update = Some(Box::new(hook));
        self
    }

    /// Run `hook` on every render traversal
    pub fn on_render(mut self, hook: impl FnMut(&mut Entity) -> EngineResult<()> + 'static) -> Self {
        self.render = Some(Box::new(hook));
        self
    }

    /// Run `hook` whenever the owner's metrics are recomputed
    pub fn on_clean(mut self, hook: impl FnMut(&mut Entity) -> EngineResult<()> + 'static) -> Self {
        self.clean = Some(Box::new(hook));
        self
    }

    /// Run `hook` on destroy
    pub fn on_destroy(mut self, hook: impl FnMut(&mut Entity) -> EngineResult<()> + 'static) -> Self {
        self.destroy = Some(Box::new(hook));
        self
    }

    /// Detach after the owner's next update
    pub fn finish(&mut self) {
        self.done = true;
    }
}

fn run(hook: &mut Option<Hook>, owner: &mut Entity) -> EngineResult<()> {
    match hook {
        Some(hook) => hook(owner),
        None => Ok(()),
    }
}

impl Component for CallbackComponent {
    fn name(&self) -> &str {
        "CallbackComponent"
    }

    fn init(&mut self, owner: &mut Entity) -> EngineResult<()> {
        run(&mut self.init, owner)
    }

    fn update(&mut self, owner: &mut Entity, delta_time: f32) -> EngineResult<()> {
        match self.update.as_mut() {
            Some(hook) => hook(owner, delta_time),
            None => Ok(()),
        }
    }

    fn render(&mut self, owner: &mut Entity) -> EngineResult<()> {
        run(&mut self.render, owner)
    }

    fn clean(&mut self, owner: &mut Entity) -> EngineResult<()> {
        run(&mut self.clean, owner)
    }

    fn destroy(&mut self, owner: &mut Entity) -> EngineResult<()> {
        run(&mut self.destroy, owner)
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::EngineError;
    use crate::render::queue::RenderQueue;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_hooks_run_in_lifecycle_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (a, b, c, d, e) = (
            Rc::clone(&log),
            Rc::clone(&log),
            Rc::clone(&log),
            Rc::clone(&log),
            Rc::clone(&log),
        );
        let mut entity = Entity::quad();
        entity
            .add_component(
                CallbackComponent::new()
                    .on_init(move |_| {
                        a.borrow_mut().push("init");
                        Ok(())
                    })
                    .on_update(move |_, _| {
                        b.borrow_mut().push("update");
                        Ok(())
                    })
                    .on_clean(move |_| {
                        c.borrow_mut().push("clean");
                        Ok(())
                    })
                    .on_render(move |_| {
                        d.borrow_mut().push("render");
                        Ok(())
                    })
                    .on_destroy(move |_| {
                        e.borrow_mut().push("destroy");
                        Ok(())
                    }),
            )
            .unwrap();

        entity.init().unwrap();
        entity.update(0.016).unwrap();
        entity.clean().unwrap();
        entity.render(&mut RenderQueue::new()).unwrap();
        entity.destroy().unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["init", "update", "clean", "render", "destroy"]
        );
    }

    #[test]
    fn test_hook_error_propagates() {
        let mut entity = Entity::group();
        entity.init().unwrap();
        entity
            .add_component(CallbackComponent::new().on_update(|_, _| {
                Err(EngineError::DependencyNotFound("texture".into()))
            }))
            .unwrap();
        let err = entity.update(0.1).unwrap_err();
        assert!(matches!(err, EngineError::DependencyNotFound(_)));
    }

    #[test]
    fn test_hook_can_mutate_owner() {
        let mut entity = Entity::quad();
        entity
            .add_component(CallbackComponent::new().on_update(|owner, dt| {
                owner.transformation_mut().translate(dt, 0.0, 0.0);
                Ok(())
            }))
            .unwrap();
        entity.init().unwrap();
        entity.clean().unwrap();
        entity.update(2.0).unwrap();
        assert!(entity.is_dirty());
        assert_eq!(entity.transformation().translation.x, 2.0);
    }

    #[test]
    fn test_finished_callback_is_detached() {
        let mut entity = Entity::group();
        entity.init().unwrap();
        entity.add_component(CallbackComponent::new()).unwrap();
        entity
            .component_mut::<CallbackComponent>()
            .unwrap()
            .finish();
        entity.update(0.0).unwrap();
        assert_eq!(entity.component_count(), 0);
    }
}
