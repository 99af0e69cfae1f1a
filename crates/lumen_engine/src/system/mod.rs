//! System driver and the modules it runs

pub mod driver;
pub mod graphics;
pub mod module;

pub use driver::{ModuleId, System, SystemFlags};
pub use graphics::GraphicsModule;
pub use module::{FrameContext, Module};
