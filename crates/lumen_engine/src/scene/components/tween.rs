//! Easing: time-based interpolation driven by entity updates

use std::any::Any;
use std::time::Duration;

use crate::core::error::EngineResult;
use crate::foundation::math::{constants::PI, Transformation};
use crate::scene::component::Component;
use crate::scene::entity::Entity;

/// Easing curve mapping linear progress `t` in `[0, 1]` to eased progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EaseFunction {
    /// No easing
    Linear,
    /// `t²`
    QuadraticIn,
    /// Decelerating quadratic
    QuadraticOut,
    /// Quadratic in, then out
    QuadraticInOut,
    /// `t³`
    CubicIn,
    /// Decelerating cubic
    CubicOut,
    /// Cubic in, then out
    CubicInOut,
    /// Quarter sine wave in
    SinusoidalIn,
    /// Quarter sine wave out
    #[default]
    SinusoidalOut,
    /// Half sine wave
    SinusoidalInOut,
    /// Exponential in
    ExponentialIn,
    /// Exponential out
    ExponentialOut,
    /// Circular in
    CircleIn,
    /// Circular out
    CircleOut,
    /// Overshoots backwards before moving
    BackIn,
    /// Overshoots the destination before settling
    BackOut,
    /// Bounces in
    BounceIn,
    /// Bounces against the destination
    BounceOut,
}

const BACK_OVERSHOOT: f32 = 1.701_58;

fn bounce_out(t: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984_375
    }
}

impl EaseFunction {
    /// Eased progress for `t`, clamped to `[0, 1]` on input
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::QuadraticIn => t * t,
            Self::QuadraticOut => t * (2.0 - t),
            Self::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Self::CubicIn => t * t * t,
            Self::CubicOut => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 * t - 2.0;
                    0.5 * u * u * u + 1.0
                }
            }
            Self::SinusoidalIn => 1.0 - (t * PI * 0.5).cos(),
            Self::SinusoidalOut => (t * PI * 0.5).sin(),
            Self::SinusoidalInOut => -0.5 * ((PI * t).cos() - 1.0),
            Self::ExponentialIn => {
                if t == 0.0 {
                    0.0
                } else {
                    2.0_f32.powf(10.0 * (t - 1.0))
                }
            }
            Self::ExponentialOut => {
                if (t - 1.0).abs() < f32::EPSILON {
                    1.0
                } else {
                    1.0 - 2.0_f32.powf(-10.0 * t)
                }
            }
            Self::CircleIn => 1.0 - (1.0 - t * t).sqrt(),
            Self::CircleOut => {
                let u = t - 1.0;
                (1.0 - u * u).sqrt()
            }
            Self::BackIn => t * t * ((BACK_OVERSHOOT + 1.0) * t - BACK_OVERSHOOT),
            Self::BackOut => {
                let u = t - 1.0;
                u * u * ((BACK_OVERSHOOT + 1.0) * u + BACK_OVERSHOOT) + 1.0
            }
            Self::BounceIn => 1.0 - bounce_out(1.0 - t),
            Self::BounceOut => bounce_out(t),
        }
    }
}

/// Timing of an ease
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EaseSettings {
    /// Curve
    pub ease: EaseFunction,
    /// Length of one play
    pub duration: Duration,
    /// Total plays; `-1` repeats forever, values below 1 play once
    pub repeats: i32,
    /// Alternate direction on every repeat
    pub reverse_on_repeat: bool,
}

impl Default for EaseSettings {
    fn default() -> Self {
        Self {
            ease: EaseFunction::SinusoidalOut,
            duration: Duration::from_millis(1000),
            repeats: 1,
            reverse_on_repeat: false,
        }
    }
}

impl EaseSettings {
    /// Builder: curve
    pub fn with_ease(mut self, ease: EaseFunction) -> Self {
        self.ease = ease;
        self
    }

    /// Builder: duration of one play
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Builder: total plays, `-1` for forever
    pub fn with_repeats(mut self, repeats: i32, reverse_on_repeat: bool) -> Self {
        self.repeats = repeats;
        self.reverse_on_repeat = reverse_on_repeat;
        self
    }
}

/// Progress bookkeeping shared by the ease components
#[derive(Debug, Clone)]
struct EaseClock {
    settings: EaseSettings,
    elapsed: f32,
    plays: i32,
    reversed: bool,
    finished: bool,
}

impl EaseClock {
    const fn new(settings: EaseSettings) -> Self {
        Self {
            settings,
            elapsed: 0.0,
            plays: 0,
            reversed: false,
            finished: false,
        }
    }

    /// Advance by `delta` seconds; returns the interpolation factor from
    /// start (0) to destination (1) and whether the ease just finished.
    fn advance(&mut self, delta: f32) -> (f32, bool) {
        let duration = self.settings.duration.as_secs_f32();
        self.elapsed += delta.max(0.0);
        let t = if duration > 0.0 {
            (self.elapsed / duration).min(1.0)
        } else {
            1.0
        };
        let eased = self.settings.ease.apply(t);
        let factor = if self.reversed { 1.0 - eased } else { eased };

        if t < 1.0 {
            return (factor, false);
        }

        self.plays += 1;
        let total = self.settings.repeats;
        if total >= 0 && self.plays >= total.max(1) {
            self.finished = true;
            return (factor, true);
        }
        self.elapsed = (self.elapsed - duration).max(0.0);
        if self.settings.reverse_on_repeat {
            self.reversed = !self.reversed;
        }
        (factor, false)
    }
}

type EaseCallback = Box<dyn FnMut(&mut Entity, f32) -> EngineResult<()>>;
type DoneCallback = Box<dyn FnMut(&mut Entity)>;

/// Drives an arbitrary value from `start` to `destination`
pub struct EaseComponent {
    clock: EaseClock,
    start: f32,
    destination: f32,
    progress: f32,
    on_progress: EaseCallback,
    on_done: Option<DoneCallback>,
}

impl EaseComponent {
    /// Ease from `start` to `destination`, calling `on_progress` with the
    /// current value every update
    pub fn new<F>(settings: EaseSettings, start: f32, destination: f32, on_progress: F) -> Self
    where
        F: FnMut(&mut Entity, f32) -> EngineResult<()> + 'static,
    {
        Self {
            clock: EaseClock::new(settings),
            start,
            destination,
            progress: start,
            on_progress: Box::new(on_progress),
            on_done: None,
        }
    }

    /// Called once when the last play finishes
    pub fn on_done(mut self, callback: impl FnMut(&mut Entity) + 'static) -> Self {
        self.on_done = Some(Box::new(callback));
        self
    }

    /// Current value
    pub const fn progress(&self) -> f32 {
        self.progress
    }
}

impl Component for EaseComponent {
    fn update(&mut self, owner: &mut Entity, delta_time: f32) -> EngineResult<()> {
        if self.clock.finished {
            return Ok(());
        }
        let (factor, finished) = self.clock.advance(delta_time);
        self.progress = self.start + (self.destination - self.start) * factor;
        (self.on_progress)(owner, self.progress)?;
        if finished {
            if let Some(done) = self.on_done.as_mut() {
                done(owner);
            }
        }
        Ok(())
    }

    fn is_done(&self) -> bool {
        self.clock.finished
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Animates the owner's transformation
pub struct TweenComponent {
    clock: EaseClock,
    start: Transformation,
    destination: Transformation,
    on_done: Option<DoneCallback>,
}

impl TweenComponent {
    /// Tween from `start` to `destination`
    pub fn new(start: Transformation, destination: Transformation, settings: EaseSettings) -> Self {
        Self {
            clock: EaseClock::new(settings),
            start,
            destination,
            on_done: None,
        }
    }

    /// Called once when the last play finishes
    pub fn on_done(mut self, callback: impl FnMut(&mut Entity) + 'static) -> Self {
        self.on_done = Some(Box::new(callback));
        self
    }

    /// Target transformation
    pub const fn destination(&self) -> &Transformation {
        &self.destination
    }
}

impl Component for TweenComponent {
    fn init(&mut self, owner: &mut Entity) -> EngineResult<()> {
        owner.set_transformation(self.start);
        Ok(())
    }

    fn update(&mut self, owner: &mut Entity, delta_time: f32) -> EngineResult<()> {
        if self.clock.finished {
            return Ok(());
        }
        let (factor, finished) = self.clock.advance(delta_time);
        owner.set_transformation(self.start.lerp(&self.destination, factor));
        if finished {
            if let Some(done) = self.on_done.as_mut() {
                done(owner);
            }
        }
        Ok(())
    }

    fn is_done(&self) -> bool {
        self.clock.finished
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    const ALL: [EaseFunction; 18] = [
        EaseFunction::Linear,
        EaseFunction::QuadraticIn,
        EaseFunction::QuadraticOut,
        EaseFunction::QuadraticInOut,
        EaseFunction::CubicIn,
        EaseFunction::CubicOut,
        EaseFunction::CubicInOut,
        EaseFunction::SinusoidalIn,
        EaseFunction::SinusoidalOut,
        EaseFunction::SinusoidalInOut,
        EaseFunction::ExponentialIn,
        EaseFunction::ExponentialOut,
        EaseFunction::CircleIn,
        EaseFunction::CircleOut,
        EaseFunction::BackIn,
        EaseFunction::BackOut,
        EaseFunction::BounceIn,
        EaseFunction::BounceOut,
    ];

    #[test]
    fn test_endpoints() {
        for ease in ALL {
            assert_relative_eq!(ease.apply(0.0), 0.0, epsilon = 1e-3);
            assert_relative_eq!(ease.apply(1.0), 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_linear_midpoint() {
        assert_relative_eq!(EaseFunction::Linear.apply(0.25), 0.25);
        assert!(EaseFunction::QuadraticIn.apply(0.5) < 0.5);
        assert!(EaseFunction::SinusoidalOut.apply(0.5) > 0.5);
    }

    #[test]
    fn test_tween_reaches_destination_and_finishes() {
        let mut entity = Entity::quad();
        entity.init().unwrap();
        let destination = Transformation::identity().with_translation(10.0, 0.0, 0.0);
        let settings = EaseSettings::default()
            .with_ease(EaseFunction::Linear)
            .with_duration(Duration::from_secs(1));
        let done = Rc::new(Cell::new(false));
        let flag = Rc::clone(&done);
        entity
            .add_component(
                TweenComponent::new(Transformation::identity(), destination, settings)
                    .on_done(move |_| flag.set(true)),
            )
            .unwrap();

        entity.update(0.5).unwrap();
        assert_relative_eq!(entity.transformation().translation.x, 5.0, epsilon = 1e-5);
        assert!(entity.has_component::<TweenComponent>());

        entity.update(0.5).unwrap();
        assert_relative_eq!(entity.transformation().translation.x, 10.0, epsilon = 1e-5);
        assert!(done.get());
        assert!(!entity.has_component::<TweenComponent>());
    }

    #[test]
    fn test_reverse_on_repeat() {
        let mut clock = EaseClock::new(
            EaseSettings::default()
                .with_ease(EaseFunction::Linear)
                .with_duration(Duration::from_secs(1))
                .with_repeats(2, true),
        );
        let (f, done) = clock.advance(1.0);
        assert_relative_eq!(f, 1.0);
        assert!(!done);
        let (f, done) = clock.advance(0.25);
        assert_relative_eq!(f, 0.75);
        assert!(!done);
        let (f, done) = clock.advance(0.75);
        assert_relative_eq!(f, 0.0);
        assert!(done);
    }

    #[test]
    fn test_infinite_repeats_never_finish() {
        let mut clock = EaseClock::new(
            EaseSettings::default()
                .with_duration(Duration::from_millis(10))
                .with_repeats(-1, false),
        );
        for _ in 0..100 {
            let (_, done) = clock.advance(0.01);
            assert!(!done);
        }
    }

    #[test]
    fn test_ease_component_reports_progress() {
        let mut entity = Entity::group();
        let seen = Rc::new(Cell::new(0.0_f32));
        let sink = Rc::clone(&seen);
        entity
            .add_component(EaseComponent::new(
                EaseSettings::default()
                    .with_ease(EaseFunction::Linear)
                    .with_duration(Duration::from_secs(2)),
                0.0,
                100.0,
                move |_, value| {
                    sink.set(value);
                    Ok(())
                },
            ))
            .unwrap();
        entity.init().unwrap();
        entity.update(1.0).unwrap();
        assert_relative_eq!(seen.get(), 50.0, epsilon = 1e-4);
    }
}
