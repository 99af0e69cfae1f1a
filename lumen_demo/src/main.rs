//! Lumen demo application
//!
//! Builds a small scene of colored quads that slide back and forth and
//! drives it through the frame loop on the headless backend. Settings come
//! from `lumen.toml` next to the working directory, if present.

use std::any::Any;
use std::time::Duration;

use lumen_engine::foundation::logging;
use lumen_engine::prelude::*;

const CONFIG_PATH: &str = "lumen.toml";
const GRID: usize = 4;

/// Logs the frame counter every few seconds of game time
struct Heartbeat {
    every: f32,
    elapsed: f32,
}

impl Heartbeat {
    fn new(every: f32) -> Self {
        Self { every, elapsed: 0.0 }
    }
}

impl Module for Heartbeat {
    fn name(&self) -> &str {
        "heartbeat"
    }

    fn init(&mut self) -> EngineResult<()> {
        self.elapsed = 0.0;
        Ok(())
    }

    fn update(&mut self, frame: &mut FrameContext) -> EngineResult<()> {
        self.elapsed += frame.delta_time();
        if self.elapsed >= self.every {
            self.elapsed -= self.every;
            log::info!("Frame {}", frame.frame());
        }
        Ok(())
    }

    fn destroy(&mut self) -> EngineResult<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn build_scene(root: &mut Entity) -> EngineResult<()> {
    root.add_component(FpsComponent::new().on_tick(|owner, stats| {
        log::info!(
            "{}: {} ups, {} fps, {} cps",
            owner.name(),
            stats.updates,
            stats.frames,
            stats.cleans
        );
    }))?;

    let step = 2.0 / GRID as f32;
    for row in 0..GRID {
        for column in 0..GRID {
            let x = -1.0 + step * (column as f32 + 0.5);
            let y = -1.0 + step * (row as f32 + 0.5);
            let shade = (row * GRID + column) as f32 / (GRID * GRID) as f32;

            let start = Transformation::identity()
                .with_translation(x, y, 0.0)
                .with_scale(step * 0.4, step * 0.4, 1.0);
            let destination = start.with_translation(x, -y, 0.0).with_rotation(0.0, 0.0, std::f32::consts::PI);

            let mut quad = Entity::quad()
                .with_name(format!("tile{row}x{column}"))
                .with_depth(i32::try_from(row).unwrap_or_default())
                .with_transformation(start)
                .with_color(Color::rgba(shade, 0.4, 1.0 - shade, 1.0));
            quad.tween(
                destination,
                EaseSettings::default()
                    .with_ease(EaseFunction::SinusoidalInOut)
                    .with_duration(Duration::from_millis(1500 + 100 * column as u64))
                    .with_repeats(-1, true),
            )?;
            root.add_child(quad)?;
        }
    }
    log::info!("Scene built with {} tiles", root.children().len());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::load_validated(CONFIG_PATH)?;
    logging::init_with_filter(&config.logging.level);

    log::info!("Starting Lumen demo");
    let mut system = System::from_config(&config);
    system.add_module(Heartbeat::new(2.0));
    system.add_module(GraphicsModule::headless(&config.renderer).with_scene(build_scene));

    match system.run() {
        Ok(()) => {
            log::info!("Demo finished after {} frames", system.frame());
            Ok(())
        }
        Err(error) => {
            log::error!("Demo aborted: {error}");
            Err(error.into())
        }
    }
}
