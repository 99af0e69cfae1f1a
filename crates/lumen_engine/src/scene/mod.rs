//! Scene graph
//!
//! Entities form a tree: each [`Entity`] owns a [`Container`] of children
//! and a list of [`Component`]s. Traversal is always top-down in insertion
//! order.
//!
//! ```text
//! root (group)
//!  ├── quad A   [TweenComponent]
//!  └── group
//!       └── quad B
//! ```
//!
//! Per-frame order, as driven by the graphics module:
//! 1. `update(dt)` - components, then children
//! 2. `clean()` - recompute stale metrics top-down
//! 3. `render(queue)` - queue drawable entities for the renderer

pub mod component;
pub mod components;
pub mod container;
pub mod entity;
pub mod metrics;

pub use component::Component;
pub use components::{
    CallbackComponent, EaseComponent, EaseFunction, EaseSettings, FpsComponent, FrameStats,
    TweenComponent,
};
pub use container::{Container, PendingRemovals};
pub use entity::{Capabilities, Entity, EntityFlags, EntityId, EntityKind, Material};
pub use metrics::Metrics;
