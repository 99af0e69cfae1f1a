//! System driver
//!
//! Owns the modules and runs the cooperative frame loop:
//!
//! ```text
//! init ─► [ tick ─► update(module 0..n) ─► wait ]* ─► destroy
//!                  ▲ stop requested / frame cap / error ends the loop
//! ```
//!
//! Modules are updated in insertion order. An error escaping a frame is
//! reported through the configured [`ErrorReporter`], the loop stops and the
//! error is returned to the caller.

use bitflags::bitflags;

use super::module::{FrameContext, Module};
use crate::core::config::{EngineConfig, FrameLoopConfig};
use crate::core::error::{check_index, EngineError, EngineResult};
use crate::core::lifecycle::Lifecycle;
use crate::core::report::{ErrorReporter, LogReporter};
use crate::foundation::time::FrameClock;

bitflags! {
    /// Driver state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SystemFlags: u8 {
        /// `init` succeeded
        const INIT = 1 << 0;
        /// `destroy` ran
        const DESTROYED = 1 << 1;
        /// The loop ends after the current frame
        const STOP_REQUESTED = 1 << 2;
    }
}

/// Stable handle of an added module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u64);

struct ModuleSlot {
    id: ModuleId,
    module: Box<dyn Module>,
    lifecycle: Lifecycle,
}

impl ModuleSlot {
    fn init(&mut self) -> EngineResult<()> {
        let mut next = self.lifecycle.clone();
        next.begin_init(self.module.name())?;
        self.module.init()?;
        self.lifecycle = next;
        log::info!("Module '{}' initialized", self.module.name());
        Ok(())
    }

    fn destroy(&mut self) -> EngineResult<()> {
        self.lifecycle.require_live(self.module.name(), "destroy")?;
        self.module.destroy()?;
        self.lifecycle.begin_destroy(self.module.name())?;
        log::info!("Module '{}' destroyed", self.module.name());
        Ok(())
    }

    fn dispose(mut self) -> EngineResult<()> {
        if self.lifecycle.is_initialized() {
            self.destroy()
        } else {
            Ok(())
        }
    }
}

/// Top-level driver owning every module
pub struct System {
    modules: Vec<ModuleSlot>,
    next_id: u64,
    flags: SystemFlags,
    frame_loop: FrameLoopConfig,
    reporter: Box<dyn ErrorReporter>,
    frame: u64,
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}

impl System {
    /// Driver with default frame loop settings and a [`LogReporter`]
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            next_id: 1,
            flags: SystemFlags::empty(),
            frame_loop: FrameLoopConfig::default(),
            reporter: Box::new(LogReporter::default()),
            frame: 0,
        }
    }

    /// Driver configured from the `frame_loop` and `errors` sections
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            frame_loop: config.frame_loop.clone(),
            reporter: Box::new(LogReporter::new(&config.errors)),
            ..Self::new()
        }
    }

    /// Builder: replace the error reporter
    pub fn with_reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Builder: replace the frame loop settings
    pub fn with_frame_loop(mut self, frame_loop: FrameLoopConfig) -> Self {
        self.frame_loop = frame_loop;
        self
    }

    /// Driver state flags
    pub const fn flags(&self) -> SystemFlags {
        self.flags
    }

    /// Frames updated since the last init or reset
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Initialized, not destroyed and no stop requested
    pub fn is_running(&self) -> bool {
        self.flags.contains(SystemFlags::INIT)
            && !self.flags.intersects(SystemFlags::DESTROYED | SystemFlags::STOP_REQUESTED)
    }

    /// End the loop after the current frame
    pub fn request_stop(&mut self) {
        if !self.flags.contains(SystemFlags::STOP_REQUESTED) {
            log::info!("Stop requested at frame {}", self.frame);
        }
        self.flags.insert(SystemFlags::STOP_REQUESTED);
    }

    // Modules

    /// Append a module. It is not initialized here; [`System::init`] or
    /// [`System::init_module`] does that.
    pub fn add_module(&mut self, module: impl Module) -> ModuleId {
        let id = ModuleId(self.next_id);
        self.next_id += 1;
        log::info!("Module '{}' added", module.name());
        self.modules.push(ModuleSlot {
            id,
            module: Box::new(module),
            lifecycle: Lifecycle::new(),
        });
        id
    }

    /// Initialize a module added after [`System::init`]
    pub fn init_module(&mut self, id: ModuleId) -> EngineResult<()> {
        let index = self.position(id)?;
        self.modules[index].init()
    }

    /// Destroy and detach the module `id`. Fails with
    /// `ObjectNotFoundInArray` if it is not attached.
    pub fn remove_module(&mut self, id: ModuleId) -> EngineResult<()> {
        let index = self.position(id)?;
        self.detach(index)
    }

    /// Destroy and detach the module called `name`. Fails with
    /// `DependencyNotFound` if there is none.
    pub fn remove_module_named(&mut self, name: &str) -> EngineResult<()> {
        let index = self
            .index_of(name)
            .ok_or_else(|| EngineError::DependencyNotFound(format!("no module named '{name}'")))?;
        self.detach(index)
    }

    /// Destroy and detach the module at `index`. Fails with
    /// `IndexOutOfBounds` if `index >= len()`.
    pub fn remove_module_at(&mut self, index: usize) -> EngineResult<()> {
        check_index(index, self.modules.len())?;
        self.detach(index)
    }

    /// Whether a module called `name` is attached
    pub fn has_module(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Position of the module called `name`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.modules.iter().position(|slot| slot.module.name() == name)
    }

    /// Module called `name`, downcast to `T`. Fails with
    /// `DependencyNotFound` if it is missing or of another type.
    pub fn module<T: Module>(&self, name: &str) -> EngineResult<&T> {
        self.modules
            .iter()
            .find(|slot| slot.module.name() == name)
            .and_then(|slot| slot.module.as_any().downcast_ref())
            .ok_or_else(|| Self::missing::<T>(name))
    }

    /// Module called `name`, downcast to `T`, mutably
    pub fn module_mut<T: Module>(&mut self, name: &str) -> EngineResult<&mut T> {
        self.modules
            .iter_mut()
            .find(|slot| slot.module.name() == name)
            .and_then(|slot| slot.module.as_any_mut().downcast_mut())
            .ok_or_else(|| Self::missing::<T>(name))
    }

    /// Names of the attached modules, in update order
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|slot| slot.module.name()).collect()
    }

    /// Number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no module is attached
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn missing<T: Module>(name: &str) -> EngineError {
        EngineError::DependencyNotFound(format!(
            "no module named '{name}' of type {}",
            std::any::type_name::<T>()
        ))
    }

    fn position(&self, id: ModuleId) -> EngineResult<usize> {
        self.modules
            .iter()
            .position(|slot| slot.id == id)
            .ok_or_else(|| EngineError::ObjectNotFoundInArray(format!("module {id:?} is not attached")))
    }

    fn detach(&mut self, index: usize) -> EngineResult<()> {
        let slot = self.modules.remove(index);
        log::info!("Module '{}' removed", slot.module.name());
        slot.dispose()
    }

    // Lifecycle

    fn require_init(&self, operation: &str) -> EngineResult<()> {
        if self.flags.contains(SystemFlags::DESTROYED) {
            return Err(EngineError::lifecycle(format!("{operation} called on a destroyed system")));
        }
        if !self.flags.contains(SystemFlags::INIT) {
            return Err(EngineError::lifecycle(format!("{operation} called before System::init")));
        }
        Ok(())
    }

    /// Initialize every module in insertion order. Fails with
    /// `DependencyNotFound` if no module is attached. If a module fails,
    /// the ones before it stay initialized and a retry resumes with it.
    ///
    /// A destroyed system may be initialized again: the modules it still
    /// owns are re-armed and go through `init` once more.
    pub fn init(&mut self) -> EngineResult<()> {
        if self.flags.contains(SystemFlags::DESTROYED) {
            log::info!("Re-initializing a destroyed system");
            for slot in &mut self.modules {
                slot.lifecycle.rearm();
            }
            self.flags.remove(SystemFlags::DESTROYED | SystemFlags::INIT);
        }
        if self.flags.contains(SystemFlags::INIT) {
            return Err(EngineError::lifecycle("the system is already initialized"));
        }
        if self.modules.is_empty() {
            return Err(EngineError::DependencyNotFound(
                "the system needs at least one module".into(),
            ));
        }
        for slot in &mut self.modules {
            if !slot.lifecycle.is_initialized() {
                slot.init()?;
            }
        }
        self.flags.insert(SystemFlags::INIT);
        self.flags.remove(SystemFlags::STOP_REQUESTED);
        self.frame = 0;
        Ok(())
    }

    /// Update every module once, in insertion order
    pub fn update(&mut self, delta_time: f32) -> EngineResult<()> {
        self.require_init("update")?;
        let mut context = FrameContext::new(delta_time, self.frame);
        for slot in &mut self.modules {
            slot.lifecycle.require_live(slot.module.name(), "update")?;
            slot.module.update(&mut context)?;
        }
        self.frame += 1;
        if context.is_stop_requested() {
            self.request_stop();
        }
        Ok(())
    }

    /// Destroy every initialized module, last added first
    pub fn destroy(&mut self) -> EngineResult<()> {
        self.require_init("destroy")?;
        for slot in self.modules.iter_mut().rev() {
            if slot.lifecycle.is_initialized() {
                slot.destroy()?;
            }
        }
        self.flags.insert(SystemFlags::DESTROYED);
        Ok(())
    }

    /// Destroy every initialized module, last added first, then detach them
    /// all and clear the flags. Allowed in any state. The system is left
    /// empty and ready for new modules and a fresh [`System::init`].
    ///
    /// Every module is detached even if one fails to destroy; the first
    /// such error is returned.
    pub fn reset(&mut self) -> EngineResult<()> {
        log::info!("Resetting system at frame {}", self.frame);
        let mut outcome = Ok(());
        for slot in self.modules.drain(..).rev() {
            let name = slot.module.name().to_string();
            if let Err(error) = slot.dispose() {
                log::error!("Module '{name}' failed to destroy during reset: {error}");
                if outcome.is_ok() {
                    outcome = Err(error);
                }
            }
        }
        self.flags = SystemFlags::empty();
        self.frame = 0;
        outcome
    }

    /// Run the frame loop until a stop is requested, the frame cap is hit
    /// or an error escapes a frame. Initializes first if needed and always
    /// destroys the modules before returning.
    pub fn run(&mut self) -> EngineResult<()> {
        if !self.flags.contains(SystemFlags::INIT) || self.flags.contains(SystemFlags::DESTROYED) {
            if let Err(error) = self.init() {
                self.report(&error);
                return Err(error);
            }
        }

        log::info!(
            "Frame loop started: {} modules, {} updates/s",
            self.modules.len(),
            self.frame_loop.updates_per_second
        );
        let mut clock = FrameClock::new(self.frame_loop.updates_per_second);
        let outcome = loop {
            if !self.is_running() {
                break Ok(());
            }
            if self.frame_loop.max_frames.is_some_and(|max| self.frame >= max) {
                log::info!("Frame cap of {} reached", self.frame);
                break Ok(());
            }
            let delta_time = clock.tick();
            if let Err(error) = self.update(delta_time) {
                break Err(error);
            }
            clock.wait();
        };

        if let Err(error) = &outcome {
            self.report(error);
            self.request_stop();
        }
        log::info!("Frame loop stopped after {} frames", self.frame);

        let destroyed = self.destroy();
        if let Err(error) = &destroyed {
            self.report(error);
        }
        outcome.and(destroyed)
    }

    fn report(&mut self, error: &EngineError) {
        let message = if self.reporter.verbose() {
            self.error_dump(error)
        } else {
            error.to_string()
        };
        self.reporter.report(error.kind(), &message);
    }

    fn error_dump(&self, error: &EngineError) -> String {
        format!(
            "{error}\n  kind: {}\n  frame: {}\n  flags: {:?}\n  modules: [{}]",
            error.kind(),
            self.frame,
            self.flags,
            self.module_names().join(", ")
        )
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("modules", &self.module_names())
            .field("flags", &self.flags)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
