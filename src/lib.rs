//! blametodo - who left that TODO?
//!
//! Walks a source tree, tracks comment regions line by line (`//`, `#`,
//! `/* */`), and reports every comment line mentioning a TODO together with
//! the author `git blame` holds responsible for it.
//!
//! # Example
//!
//! ```rust,no_run
//! use blametodo::*;
//! use std::path::Path;
//!
//! let config = config::load_config(None).unwrap();
//! let blame = git::blame_source_for(&config, Path::new(".")).unwrap();
//! let scanner = scanner::Scanner::new(&config, blame.as_ref()).unwrap();
//!
//! for finding in scanner.scan_directory(Path::new(".")).unwrap().findings {
//!     println!("{}", finding);
//! }
//! ```

pub mod cli;
pub mod comments;
pub mod config;
pub mod error;
pub mod git;
pub mod models;
pub mod reporter;
pub mod scanner;

// Re-export commonly used types
pub use error::{AttributionError, ScanError};
pub use git::{BlameSource, InMemoryBlame};
pub use models::{Config, Finding, Report};
