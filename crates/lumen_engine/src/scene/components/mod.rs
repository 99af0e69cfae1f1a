//! Stock components

/// Closures hooked into every stage of the owner's lifecycle
pub mod callback;
/// Update, frame and clean rate counter
pub mod fps;
/// Transformation tweens and easing curves
pub mod tween;

pub use callback::CallbackComponent;
pub use fps::{FpsComponent, FrameStats};
pub use tween::{EaseComponent, EaseFunction, EaseSettings, TweenComponent};
