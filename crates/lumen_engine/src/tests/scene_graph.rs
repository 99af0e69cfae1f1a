//! Scene graph scenarios: lifecycle guards, container indexing, deferred
//! removal and metric propagation

use crate::core::error::EngineError;
use crate::core::lifecycle::LifecycleState;
use crate::foundation::math::{constants::HALF_PI, Transformation, Vec2};
use crate::render::queue::RenderQueue;
use crate::scene::{CallbackComponent, Capabilities, Entity};
use approx::assert_relative_eq;

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(x: f32, angle: f32, scale: f32) -> Transformation {
        Transformation::identity()
            .with_translation(x, 1.0, 0.0)
            .with_rotation(0.0, 0.0, angle)
            .with_scale(scale, scale, 1.0)
    }

    #[test]
    fn test_render_before_init_fails() {
        let mut quad = Entity::quad();
        let err = quad.render(&mut RenderQueue::new()).unwrap_err();
        assert!(matches!(err, EngineError::Lifecycle(_)));
    }

    #[test]
    fn test_update_and_clean_before_init_fail() {
        let mut quad = Entity::quad();
        assert!(matches!(quad.update(0.1).unwrap_err(), EngineError::Lifecycle(_)));
        assert!(matches!(quad.clean().unwrap_err(), EngineError::Lifecycle(_)));
    }

    #[test]
    fn test_double_init_and_double_destroy_fail() {
        let mut quad = Entity::quad();
        quad.init().unwrap();
        assert!(matches!(quad.init().unwrap_err(), EngineError::Lifecycle(_)));
        quad.destroy().unwrap();
        assert!(matches!(quad.destroy().unwrap_err(), EngineError::Lifecycle(_)));
        assert!(matches!(
            quad.render(&mut RenderQueue::new()).unwrap_err(),
            EngineError::Lifecycle(_)
        ));
    }

    #[test]
    fn test_remove_at_invalid_index() {
        let mut root = Entity::group();
        root.add_child(Entity::quad()).unwrap();
        root.add_child(Entity::quad()).unwrap();
        root.init().unwrap();

        root.remove_child_at(1).unwrap();
        let err = root.remove_child_at(1).unwrap_err();
        assert!(matches!(err, EngineError::IndexOutOfBounds { index: 1, len: 1 }));
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_remove_non_member_leaves_count() {
        let mut root = Entity::group();
        root.add_child(Entity::quad()).unwrap();
        let stranger = Entity::quad();

        let err = root.remove_child(stranger.id()).unwrap_err();
        assert!(matches!(err, EngineError::ObjectNotFoundInArray(_)));
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_grandchild_is_not_a_direct_child() {
        let mut root = Entity::group();
        let mut parent = Entity::group();
        let grandchild = parent.add_child(Entity::quad()).unwrap();
        root.add_child(parent).unwrap();

        assert!(root.find_descendant(grandchild).is_some());
        assert!(matches!(
            root.remove_child(grandchild).unwrap_err(),
            EngineError::ObjectNotFoundInArray(_)
        ));
    }

    #[test]
    fn test_removed_child_is_destroyed() {
        let mut root = Entity::group();
        let destroyed = std::rc::Rc::new(std::cell::Cell::new(false));
        let flag = std::rc::Rc::clone(&destroyed);
        let mut child = Entity::quad();
        child
            .add_component(CallbackComponent::new().on_destroy(move |_| {
                flag.set(true);
                Ok(())
            }))
            .unwrap();
        let id = root.add_child(child).unwrap();
        root.init().unwrap();

        root.remove_child(id).unwrap();
        assert!(destroyed.get());
    }

    #[test]
    fn test_removing_uninitialized_child_just_drops_it() {
        let mut root = Entity::group();
        let id = root.add_child(Entity::quad()).unwrap();
        root.remove_child(id).unwrap();
        assert!(root.children().is_empty());
    }

    #[test]
    fn test_child_added_to_live_parent_is_initialized() {
        let mut root = Entity::group();
        let early = root.add_child(Entity::quad()).unwrap();
        assert_eq!(
            root.children().find(early).unwrap().state(),
            LifecycleState::Uninitialized
        );

        root.init().unwrap();
        assert!(root.children().find(early).unwrap().is_initialized());

        let late = root.add_child(Entity::quad()).unwrap();
        assert!(root.children().find(late).unwrap().is_initialized());
    }

    #[test]
    fn test_three_level_world_composition() {
        let (ta, tb, tc) = (placed(2.0, HALF_PI, 2.0), placed(-1.0, 0.3, 0.5), placed(0.5, -1.2, 3.0));

        let mut c = Entity::quad().with_transformation(tc);
        let c_id = c.id();
        c.set_depth(2);
        let mut b = Entity::group().with_transformation(tb);
        b.add_child(c).unwrap();
        let mut a = Entity::group().with_transformation(ta);
        a.add_child(b).unwrap();

        a.init().unwrap();
        a.clean().unwrap();

        let expected = ta.to_matrix() * tb.to_matrix() * tc.to_matrix();
        let world = *a.find_descendant(c_id).unwrap().metrics().world();
        assert_relative_eq!(world, expected, epsilon = 1e-5);
    }

    #[test]
    fn test_dirty_root_invalidates_subtree_and_clean_is_idempotent() {
        let mut root = Entity::group();
        let mut middle = Entity::group().with_transformation(placed(1.0, 0.0, 1.0));
        let leaf = middle.add_child(Entity::quad()).unwrap();
        let middle_id = root.add_child(middle).unwrap();
        root.init().unwrap();
        root.clean().unwrap();
        assert!(!root.find_descendant(leaf).unwrap().is_dirty());

        root.transformation_mut().translate(5.0, 0.0, 0.0);
        assert!(root.find_descendant(middle_id).unwrap().is_dirty());
        assert!(root.find_descendant(leaf).unwrap().is_dirty());

        root.clean().unwrap();
        let first = root.find_descendant(leaf).unwrap().metrics().clone();
        root.clean().unwrap();
        let second = root.find_descendant(leaf).unwrap().metrics().clone();
        assert_eq!(first, second);
        assert_relative_eq!(first.world()[(0, 3)], 6.0, epsilon = 1e-6);
    }

    #[test]
    fn test_removal_during_traversal_is_deferred() {
        let mut root = Entity::group();
        root.add_child(Entity::quad().with_name("a")).unwrap();
        let b = root.add_child(Entity::quad().with_name("b")).unwrap();
        root.add_child(Entity::quad().with_name("c")).unwrap();
        root.init().unwrap();

        let mut visited = Vec::new();
        root.children_mut()
            .traverse_mut(|child, pending| {
                visited.push(child.name().to_string());
                if child.name() == "a" {
                    pending.remove(b)?;
                }
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, vec!["a", "b", "c"]);
        assert_eq!(root.children().len(), 2);
        assert!(!root.children().contains(b));
    }

    #[test]
    fn test_deferred_removal_rejects_strangers() {
        let mut root = Entity::group();
        root.add_child(Entity::quad()).unwrap();
        let stranger = Entity::quad().id();
        let err = root
            .children_mut()
            .traverse_mut(|_, pending| pending.remove(stranger))
            .unwrap_err();
        assert!(matches!(err, EngineError::ObjectNotFoundInArray(_)));
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_killed_child_is_reaped_after_update() {
        let mut root = Entity::group();
        let mut doomed = Entity::quad();
        doomed
            .add_component(CallbackComponent::new().on_update(|owner, _| {
                owner.kill();
                Ok(())
            }))
            .unwrap();
        root.add_child(doomed).unwrap();
        let survivor = root.add_child(Entity::quad()).unwrap();
        root.init().unwrap();

        root.update(0.016).unwrap();
        assert_eq!(root.children().ids(), vec![survivor]);
    }

    #[test]
    fn test_disabled_subtree_is_skipped() {
        let mut root = Entity::group();
        let mut hidden = Entity::quad();
        hidden.add_child(Entity::quad()).unwrap();
        hidden.set_enabled(false);
        root.add_child(hidden).unwrap();
        root.add_child(Entity::quad()).unwrap();
        root.init().unwrap();
        root.clean().unwrap();

        let mut queue = RenderQueue::new();
        root.render(&mut queue).unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_hit_test_picks_topmost_selectable() {
        let at = |x: f32| Transformation::identity().with_translation(x, 0.0, 0.0).with_scale(0.5, 0.5, 1.0);
        let mut root = Entity::group();
        let low = root.add_child(Entity::quad().with_depth(0).with_transformation(at(0.0))).unwrap();
        let high = root.add_child(Entity::quad().with_depth(2).with_transformation(at(0.25))).unwrap();
        root.add_child(
            Entity::quad()
                .with_depth(5)
                .with_capabilities(Capabilities::DRAWABLE | Capabilities::POSITIONED_2D)
                .with_transformation(at(0.25)),
        )
        .unwrap();
        root.init().unwrap();
        root.clean().unwrap();

        // overlap of both selectable quads
        assert_eq!(root.hit_test(Vec2::new(0.2, 0.0)), Some(high));
        // only the low quad reaches x = -0.4
        assert_eq!(root.hit_test(Vec2::new(-0.4, 0.0)), Some(low));
        assert_eq!(root.hit_test(Vec2::new(3.0, 3.0)), None);
        // the deeper quad there is not selectable
        assert_eq!(root.hit_test(Vec2::new(0.7, 0.0)), Some(high));

        root.children_mut().find_mut(high).unwrap().set_enabled(false);
        assert_eq!(root.hit_test(Vec2::new(0.2, 0.0)), Some(low));
    }

    #[test]
    fn test_hit_test_prefers_later_sibling_at_equal_depth() {
        let mut root = Entity::group();
        let mut parent = Entity::quad();
        let nested = parent.add_child(Entity::quad()).unwrap();
        root.add_child(parent).unwrap();
        let sibling = root.add_child(Entity::quad()).unwrap();
        root.init().unwrap();
        root.clean().unwrap();

        assert_eq!(root.hit_test(Vec2::new(0.0, 0.0)), Some(sibling));
        root.remove_child(sibling).unwrap();
        assert_eq!(root.hit_test(Vec2::new(0.0, 0.0)), Some(nested));
    }

    #[test]
    fn test_component_added_by_hook_runs_next_pass() {
        let mut quad = Entity::quad();
        quad.add_component(CallbackComponent::new().on_update(|owner, _| {
            if !owner.has_property("spawned") {
                owner.set_property("spawned", true);
                owner.add_component(CallbackComponent::new().on_update(|owner, _| {
                    owner.set_property("second ran", true);
                    Ok(())
                }))?;
            }
            Ok(())
        }))
        .unwrap();
        quad.init().unwrap();

        quad.update(0.0).unwrap();
        assert_eq!(quad.property::<bool>("spawned"), Some(&true));
        assert!(!quad.has_property("second ran"));
        assert_eq!(quad.component_count(), 2);

        quad.update(0.0).unwrap();
        assert_eq!(quad.property::<bool>("second ran"), Some(&true));
    }

    #[test]
    fn test_remove_component() {
        let mut quad = Entity::quad();
        quad.add_component(CallbackComponent::new()).unwrap();
        quad.init().unwrap();
        quad.remove_component::<CallbackComponent>().unwrap();
        assert!(matches!(
            quad.remove_component::<CallbackComponent>().unwrap_err(),
            EngineError::ObjectNotFoundInArray(_)
        ));
    }
}
