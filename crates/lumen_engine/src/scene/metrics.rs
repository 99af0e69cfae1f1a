//! Cached, derived placement data for an entity

use crate::foundation::math::{Mat4, Rect, Transformation};

/// Matrices and bounds derived from an entity's transformation and its
/// parent's world matrix. Valid only while the owner's dirty flag is clear.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    local: Mat4,
    world: Mat4,
    bounds: Rect,
    generation: u64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            local: Mat4::identity(),
            world: Mat4::identity(),
            bounds: Rect::default(),
            generation: 0,
        }
    }
}

impl Metrics {
    /// Recompute from the parent's world matrix
    pub(crate) fn recompute(&mut self, parent_world: &Mat4, transformation: &Transformation) {
        self.local = transformation.to_matrix();
        self.world = parent_world * self.local;
        self.bounds = Rect::from_unit_quad(&self.world);
        self.generation += 1;
    }

    /// Local matrix `T * R * S`
    pub const fn local(&self) -> &Mat4 {
        &self.local
    }

    /// Parent world matrix composed with the local matrix
    pub const fn world(&self) -> &Mat4 {
        &self.world
    }

    /// World-space bounds of the entity's unit quad
    pub const fn bounds(&self) -> &Rect {
        &self.bounds
    }

    /// Number of recomputations so far
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}
