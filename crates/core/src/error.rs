use std::io;
use std::path::PathBuf;

/// Errors that abort a generation run.
///
/// None of these are recoverable: a run either produces one complete file or
/// fails with exactly one of these.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("failed to load package from '{location}': {reason}")]
    Load { location: String, reason: String },

    #[error("found no type named {name} in '{package}'")]
    NotFound { name: String, package: String },

    #[error("expected {name} to be a named type, but it is {found}")]
    NotNamed { name: String, found: String },

    #[error("expected {name} to be an interface, but it is {found}")]
    NotInterface { name: String, found: String },

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("{hook}: method {method}: {reason}")]
    Precondition {
        hook: String,
        method: String,
        reason: String,
    },

    #[error("failed to {action} '{}': {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Shorthand for building an [`Error::Io`] inside `map_err`.
    pub fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

/// Result type alias for dblog operations
pub type Result<T> = std::result::Result<T, Error>;
