//! Engine error taxonomy
//!
//! The first four variants are programmer errors: they are returned to the
//! caller and the operation that raised them leaves its target untouched.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Operation invalid for the object's lifecycle state
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// Positional access past the end of an ordered collection
    #[error("Index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Collection length at the time of the request
        len: usize,
    },

    /// Removal of an object that is not a member of the collection
    #[error("Object not found in array: {0}")]
    ObjectNotFoundInArray(String),

    /// A required collaborator (protocol, module) is not registered
    #[error("Dependency not found: {0}")]
    DependencyNotFound(String),

    /// The graphics backend rejected a call
    #[error("Backend error: {0}")]
    Backend(String),

    /// Configuration could not be loaded or saved
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Image decoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Coarse classification of an [`EngineError`], handed to error reporters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`EngineError::Lifecycle`]
    Lifecycle,
    /// See [`EngineError::IndexOutOfBounds`]
    IndexOutOfBounds,
    /// See [`EngineError::ObjectNotFoundInArray`]
    ObjectNotFoundInArray,
    /// See [`EngineError::DependencyNotFound`]
    DependencyNotFound,
    /// See [`EngineError::Backend`]
    Backend,
    /// Config, image or IO failures
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lifecycle => "LifecycleError",
            Self::IndexOutOfBounds => "IndexOutOfBounds",
            Self::ObjectNotFoundInArray => "ObjectNotFoundInArray",
            Self::DependencyNotFound => "DependencyNotFound",
            Self::Backend => "BackendError",
            Self::Io => "IoError",
        };
        f.write_str(name)
    }
}

impl EngineError {
    /// Shorthand for [`EngineError::Lifecycle`]
    pub fn lifecycle(message: impl Into<String>) -> Self {
        Self::Lifecycle(message.into())
    }

    /// Shorthand for [`EngineError::Backend`]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Classification used by reporters
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Lifecycle(_) => ErrorKind::Lifecycle,
            Self::IndexOutOfBounds { .. } => ErrorKind::IndexOutOfBounds,
            Self::ObjectNotFoundInArray(_) => ErrorKind::ObjectNotFoundInArray,
            Self::DependencyNotFound(_) => ErrorKind::DependencyNotFound,
            Self::Backend(_) => ErrorKind::Backend,
            Self::Config(_) | Self::Image(_) | Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Bounds check for positional access
pub(crate) fn check_index(index: usize, len: usize) -> EngineResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(EngineError::IndexOutOfBounds { index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(EngineError::lifecycle("x").kind(), ErrorKind::Lifecycle);
        assert_eq!(
            EngineError::IndexOutOfBounds { index: 3, len: 1 }.kind(),
            ErrorKind::IndexOutOfBounds
        );
        let io = EngineError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(io.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_display() {
        let err = EngineError::IndexOutOfBounds { index: 4, len: 2 };
        assert_eq!(err.to_string(), "Index 4 out of bounds for length 2");
        assert_eq!(ErrorKind::DependencyNotFound.to_string(), "DependencyNotFound");
    }

    #[test]
    fn test_check_index() {
        assert!(check_index(0, 1).is_ok());
        assert!(matches!(
            check_index(1, 1),
            Err(EngineError::IndexOutOfBounds { index: 1, len: 1 })
        ));
    }
}
