//! Error reporting collaborator
//!
//! The system driver hands any error that escapes a frame to an
//! [`ErrorReporter`] before stopping the loop.

use std::path::PathBuf;

use super::config::ErrorConfig;
use super::error::ErrorKind;

/// Sink for errors that abort the frame loop
pub trait ErrorReporter {
    /// Report an error; `message` is either the bare error text or a
    /// verbose dump, depending on [`ErrorReporter::verbose`]
    fn report(&mut self, kind: ErrorKind, message: &str);

    /// Whether the driver should build a full dump for this reporter
    fn verbose(&self) -> bool {
        false
    }
}

/// Default reporter: logs through `log::error!` and optionally mirrors the
/// report into a file.
#[derive(Debug, Clone, Default)]
pub struct LogReporter {
    verbose: bool,
    log_file: Option<PathBuf>,
}

impl LogReporter {
    /// Reporter configured from the `errors` config section
    pub fn new(config: &ErrorConfig) -> Self {
        Self {
            verbose: config.verbose,
            log_file: config.log_file.clone(),
        }
    }
}

impl ErrorReporter for LogReporter {
    fn report(&mut self, kind: ErrorKind, message: &str) {
        log::error!("{}: {}", kind, message);

        if let Some(path) = &self.log_file {
            let contents = format!("{kind}: {message}\n");
            if let Err(e) = std::fs::write(path, contents) {
                log::warn!("Failed to write error log {}: {}", path.display(), e);
            }
        }
    }

    fn verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_written() {
        let path = std::env::temp_dir().join(format!("lumen_{}_err.log", std::process::id()));
        let mut reporter = LogReporter::new(&ErrorConfig {
            verbose: true,
            log_file: Some(path.clone()),
        });
        assert!(reporter.verbose());
        reporter.report(ErrorKind::DependencyNotFound, "no module named 'audio'");
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("DependencyNotFound: no module named 'audio'"));
        let _ = std::fs::remove_file(&path);
    }
}
