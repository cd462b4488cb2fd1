use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to resolve the author of a single line
#[derive(Debug, Error)]
pub enum AttributionError {
    #[error("failed to run `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("no commit hash in blame output for {}:{line}", .path.display())]
    MissingCommit { path: PathBuf, line: usize },

    #[error("libgit2: {0}")]
    Git(#[from] git2::Error),

    #[error("no author recorded for {}:{line}", .path.display())]
    NotFound { path: PathBuf, line: usize },

    #[error("repository handle poisoned by a panicked worker")]
    Poisoned,
}

/// Errors that abort a scan
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid pattern `{pattern}`")]
    PatternCompile {
        pattern: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("failed to attribute {}:{line}", .path.display())]
    Attribution {
        path: PathBuf,
        line: usize,
        #[source]
        source: AttributionError,
    },

    #[error("failed to read {}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
