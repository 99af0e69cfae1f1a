//! Lifecycle state machine shared by entities, components, modules,
//! renderers and GPU resource objects.
//!
//! `Uninitialized -> Initialized -> Destroyed`; `Destroyed` is terminal.
//! Owners embed a [`Lifecycle`] and route their `init`/`update`/`render`/
//! `destroy` entry points through it so misuse surfaces as
//! [`EngineError::Lifecycle`] before any state is touched.

use super::error::{EngineError, EngineResult};

/// Where an object is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Constructed, nothing acquired yet
    #[default]
    Uninitialized,
    /// Ready for update and render calls
    Initialized,
    /// Released; every further call fails
    Destroyed,
}

/// Guard enforcing the lifecycle transitions
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    /// Fresh guard in the `Uninitialized` state
    pub const fn new() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
        }
    }

    /// Guard in the terminal state, used for moved-from objects
    pub(crate) const fn inert() -> Self {
        Self {
            state: LifecycleState::Destroyed,
        }
    }

    /// Current state
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// `true` between a successful `init` and `destroy`
    pub fn is_initialized(&self) -> bool {
        self.state == LifecycleState::Initialized
    }

    /// `true` once destroyed
    pub fn is_destroyed(&self) -> bool {
        self.state == LifecycleState::Destroyed
    }

    /// Transition to `Initialized`; fails unless currently `Uninitialized`
    pub fn begin_init(&mut self, what: &str) -> EngineResult<()> {
        match self.state {
            LifecycleState::Uninitialized => {
                self.state = LifecycleState::Initialized;
                Ok(())
            }
            LifecycleState::Initialized => Err(EngineError::lifecycle(format!(
                "{what} is already initialized"
            ))),
            LifecycleState::Destroyed => Err(EngineError::lifecycle(format!(
                "{what} was destroyed and cannot be initialized again"
            ))),
        }
    }

    /// Fail unless `Initialized`; `operation` names the rejected call
    pub fn require_live(&self, what: &str, operation: &str) -> EngineResult<()> {
        match self.state {
            LifecycleState::Initialized => Ok(()),
            LifecycleState::Uninitialized => Err(EngineError::lifecycle(format!(
                "{operation} called on {what} before init"
            ))),
            LifecycleState::Destroyed => Err(EngineError::lifecycle(format!(
                "{operation} called on {what} after destroy"
            ))),
        }
    }

    /// Transition to `Destroyed`; fails unless currently `Initialized`
    pub fn begin_destroy(&mut self, what: &str) -> EngineResult<()> {
        self.require_live(what, "destroy")?;
        self.state = LifecycleState::Destroyed;
        Ok(())
    }

    /// Re-arm a destroyed guard. Only the system driver does this, when a
    /// destroyed system is initialized again.
    pub(crate) fn rearm(&mut self) {
        if self.state == LifecycleState::Destroyed {
            self.state = LifecycleState::Uninitialized;
        }
    }
}
