//! # Core Engine Module
//!
//! Shared abstractions every subsystem depends on.
//!
//! ## Organization
//!
//! - **Error**: the engine error taxonomy and result alias
//! - **Lifecycle**: the init/destroy state machine
//! - **Report**: the error reporting collaborator
//! - **Config**: serializable engine settings

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod report;

pub use config::{Config, ConfigError, EngineConfig};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use report::{ErrorReporter, LogReporter};
