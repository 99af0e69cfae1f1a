//! # Lumen Engine
//!
//! The runtime core of a small 2D game engine: a scene graph of entities and
//! components, a renderer that dispatches entities to per-kind render
//! protocols, move-only GPU resource objects, and a module driver running
//! the frame loop.
//!
//! ## Features
//!
//! - **Scene Graph**: owned entity trees with dirty-tracked world metrics
//! - **Components**: tweens, callbacks and frame counters attached to entities
//! - **Render Protocols**: one draw strategy per entity kind, looked up at runtime
//! - **GPU Resources**: bind-checked buffers, textures, shaders and framebuffers
//! - **Pluggable Backend**: any [`GraphicsDevice`](render::GraphicsDevice); a headless one ships in-tree
//! - **Module Driver**: cooperative frame loop with error reporting and reset
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumen_engine::prelude::*;
//!
//! fn main() -> EngineResult<()> {
//!     lumen_engine::foundation::logging::init();
//!     let config = EngineConfig::default().with_max_frames(120);
//!
//!     let graphics = GraphicsModule::headless(&config.renderer).with_scene(|root| {
//!         let mut quad = Entity::quad().with_color(Color::RED);
//!         quad.tween(
//!             Transformation::identity().with_translation(0.5, 0.0, 0.0),
//!             EaseSettings::default(),
//!         )?;
//!         root.add_child(quad)?;
//!         Ok(())
//!     });
//!
//!     let mut system = System::from_config(&config);
//!     system.add_module(graphics);
//!     system.run()
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod config;
pub mod core;
pub mod foundation;

// Runtime
pub mod render;
pub mod scene;
pub mod system;

#[cfg(test)]
mod tests;

pub use crate::core::{EngineConfig, EngineError, EngineResult, ErrorKind};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::Config,
        core::{EngineConfig, EngineError, EngineResult, ErrorKind, ErrorReporter, LogReporter},
        foundation::{
            color::Color,
            math::{Mat4, Transformation, Vec2, Vec3},
            time::FrameClock,
        },
        render::{
            GraphicsDevice, HeadlessDevice, HeadlessSurface, QuadProtocol, RenderProtocol, RenderSurface, Renderer,
            StandardRenderer,
        },
        scene::{
            CallbackComponent, Capabilities, Component, EaseFunction, EaseSettings, Entity, EntityId, EntityKind,
            FpsComponent, TweenComponent,
        },
        system::{FrameContext, GraphicsModule, Module, System},
    };
}
