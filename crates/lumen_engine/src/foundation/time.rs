//! Frame timing

use std::time::{Duration, Instant};

/// Frame clock for the driver loop.
///
/// Measures the time between ticks and, when a target rate is set, reports
/// how long the loop should sleep to hold that rate.
#[derive(Debug)]
pub struct FrameClock {
    target: Option<Duration>,
    last_tick: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl FrameClock {
    /// Clock targeting `updates_per_second`; zero means unthrottled
    pub fn new(updates_per_second: u32) -> Self {
        let target = (updates_per_second > 0)
            .then(|| Duration::from_secs_f64(1.0 / f64::from(updates_per_second)));
        Self {
            target,
            last_tick: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance one frame and return the elapsed seconds since the previous tick
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_tick).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_tick = now;
        self.frame_count += 1;
        self.delta_time
    }

    /// Time left in the current frame budget, if throttled
    pub fn remaining(&self) -> Option<Duration> {
        let target = self.target?;
        target.checked_sub(self.last_tick.elapsed())
    }

    /// Sleep out the rest of the frame budget
    pub fn wait(&self) {
        if let Some(remaining) = self.remaining() {
            std::thread::sleep(remaining);
        }
    }

    /// Seconds measured by the last tick
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Accumulated seconds across all ticks
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Ticks so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
