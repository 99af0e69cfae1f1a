//! Logging bootstrap
//!
//! The engine logs through the `log` facade; binaries pick the sink. This
//! wires up `env_logger`, honouring `RUST_LOG` over the configured level.

pub use log::{debug, error, info, trace, warn};

/// Initialize logging at `info`, or whatever `RUST_LOG` says
pub fn init() {
    init_with_filter("info");
}

/// Initialize logging with a default filter such as `"debug"` or `"lumen_engine=trace"`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_with_filter(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    if env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init()
        .is_ok()
    {
        log::debug!("Logging initialized with default filter '{}'", filter);
    }
}
