//! Stock render protocols

pub mod quad;

pub use quad::{EntityUniforms, QuadProtocol, QuadVertex};
