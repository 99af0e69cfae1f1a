use std::any::Any;

use crate::core::error::EngineResult;
use crate::scene::component::Component;
use crate::scene::entity::Entity;

/// Counts gathered over the last full second
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Updates per second
    pub updates: u32,
    /// Render traversals per second
    pub frames: u32,
    /// Metric recomputations per second
    pub cleans: u32,
}

type TickCallback = Box<dyn FnMut(&mut Entity, &FrameStats)>;

/// Measures how often its owner is updated, rendered and cleaned
#[derive(Default)]
pub struct FpsComponent {
    current: FrameStats,
    last: FrameStats,
    elapsed: f32,
    on_tick: Option<TickCallback>,
}

impl FpsComponent {
    /// Counter without a tick callback
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `callback` once a second with the finished counts
    pub fn on_tick(mut self, callback: impl FnMut(&mut Entity, &FrameStats) + 'static) -> Self {
        self.on_tick = Some(Box::new(callback));
        self
    }

    /// Counts of the last full second
    pub const fn stats(&self) -> &FrameStats {
        &self.last
    }
}

impl Component for FpsComponent {
    fn name(&self) -> &str {
        "FpsComponent"
    }

    fn update(&mut self, owner: &mut Entity, delta_time: f32) -> EngineResult<()> {
        self.current.updates += 1;
        self.elapsed += delta_time;
        if self.elapsed >= 1.0 {
            self.elapsed -= 1.0;
            self.last = std::mem::take(&mut self.current);
            log::trace!(
                "{}: {} ups, {} fps, {} cps",
                owner.name(),
                self.last.updates,
                self.last.frames,
                self.last.cleans
            );
            if let Some(tick) = self.on_tick.as_mut() {
                tick(owner, &self.last);
            }
        }
        Ok(())
    }

    fn render(&mut self, _owner: &mut Entity) -> EngineResult<()> {
        self.current.frames += 1;
        Ok(())
    }

    fn clean(&mut self, _owner: &mut Entity) -> EngineResult<()> {
        self.current.cleans += 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
