use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A TODO found inside a comment, attributed to the author of its line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Path to the file containing the TODO, as enumerated from the scan root
    pub file_path: PathBuf,

    /// Line number where the TODO was found (1-indexed)
    pub line_number: usize,

    /// Author of the commit that last touched the line
    pub author: String,

    /// The line content with surrounding whitespace trimmed
    pub text: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The trailing space is part of the established output format
        write!(
            f,
            "{}:{} ({}) {} ",
            self.file_path.display(),
            self.line_number,
            self.author,
            self.text
        )
    }
}

/// Every finding of one scan, in file order then line order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Path that was scanned
    pub scan_path: PathBuf,

    /// Number of files that were read
    pub files_scanned: usize,

    /// Total number of findings
    pub total_count: usize,

    /// Count of findings by author
    pub by_author: BTreeMap<String, usize>,

    /// All findings
    pub findings: Vec<Finding>,
}

impl Report {
    /// Concatenate per-file finding buffers into a report
    pub fn new(scan_path: PathBuf, per_file: Vec<Vec<Finding>>) -> Self {
        let files_scanned = per_file.len();
        let findings: Vec<Finding> = per_file.into_iter().flatten().collect();

        let mut by_author: BTreeMap<String, usize> = BTreeMap::new();
        for finding in &findings {
            *by_author.entry(finding.author.clone()).or_insert(0) += 1;
        }

        Self {
            scan_path,
            files_scanned,
            total_count: findings.len(),
            by_author,
            findings,
        }
    }
}

/// Where author names come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlameBackend {
    /// Shell out to `git blame` and `git show`
    #[default]
    Cli,
    /// Blame in-process through libgit2
    Libgit2,
}

/// Configuration for the scanner
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Attribution backend
    #[serde(default)]
    pub blame_backend: BlameBackend,

    /// Upper bound for each git subprocess, in seconds
    #[serde(default = "default_blame_timeout_secs")]
    pub blame_timeout_secs: u64,

    /// Drop findings whose author cannot be resolved instead of aborting
    #[serde(default)]
    pub skip_unattributed: bool,

    /// Worker threads for scanning files (0 picks the rayon default)
    #[serde(default)]
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blame_backend: BlameBackend::default(),
            blame_timeout_secs: default_blame_timeout_secs(),
            skip_unattributed: false,
            threads: 0,
        }
    }
}

fn default_blame_timeout_secs() -> u64 {
    30
}
