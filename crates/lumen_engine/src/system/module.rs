//! Module trait: a top-level subsystem driven by the [`System`](super::System)

use std::any::Any;

use crate::core::error::EngineResult;

/// Per-frame data handed to every module update
#[derive(Debug, Clone)]
pub struct FrameContext {
    delta_time: f32,
    frame: u64,
    stop_requested: bool,
}

impl FrameContext {
    pub(crate) const fn new(delta_time: f32, frame: u64) -> Self {
        Self {
            delta_time,
            frame,
            stop_requested: false,
        }
    }

    /// Seconds since the previous frame
    pub const fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Zero-based frame number
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Ask the driver to stop after this frame
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// Whether any module asked to stop during this frame
    pub const fn is_stop_requested(&self) -> bool {
        self.stop_requested
    }
}

/// Subsystem plugged into the driver (graphics, audio, networking, ...).
///
/// The driver guards the lifecycle: `update` is only called between a
/// successful `init` and `destroy`. A module must accept `init` again after
/// `destroy`: [`System::init`](super::System::init) on a destroyed system
/// restarts every module it still owns.
pub trait Module: Any {
    /// Unique name used for lookup and removal
    fn name(&self) -> &str;

    /// Acquire resources
    fn init(&mut self) -> EngineResult<()>;

    /// Advance one frame
    fn update(&mut self, frame: &mut FrameContext) -> EngineResult<()>;

    /// Release resources
    fn destroy(&mut self) -> EngineResult<()>;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
