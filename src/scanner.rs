use crate::comments::CommentPatterns;
use crate::error::ScanError;
use crate::git::BlameSource;
use crate::models::{Config, Finding, Report};
use ignore::WalkBuilder;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Component, Path, PathBuf};

/// Where a file's line iteration currently stands with respect to comments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentState {
    #[default]
    Normal,
    InBlockComment,
}

/// Outcome of feeding one line to the comment state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// State to carry into the next line
    pub next: CommentState,
    /// Whether the line is a TODO inside a comment region
    pub is_todo: bool,
}

/// Advance the comment state machine by one line.
///
/// Depends only on the current state and the line itself.
pub fn step(patterns: &CommentPatterns, state: CommentState, line: &str) -> Step {
    match state {
        CommentState::InBlockComment => Step {
            is_todo: patterns.has_todo(line),
            next: if patterns.closes_block(line) {
                CommentState::Normal
            } else {
                CommentState::InBlockComment
            },
        },
        CommentState::Normal => {
            let class = patterns.classify(line);
            if !class.is_comment {
                return Step {
                    next: CommentState::Normal,
                    is_todo: false,
                };
            }

            Step {
                is_todo: patterns.has_todo(line),
                next: if class.opens_unclosed_block {
                    CommentState::InBlockComment
                } else {
                    CommentState::Normal
                },
            }
        }
    }
}

/// Finds attributed TODO comments in files
pub struct Scanner<'a> {
    patterns: CommentPatterns,
    blame: &'a dyn BlameSource,
    skip_unattributed: bool,
    threads: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(config: &Config, blame: &'a dyn BlameSource) -> Result<Self, ScanError> {
        Ok(Self {
            patterns: CommentPatterns::compile()?,
            blame,
            skip_unattributed: config.skip_unattributed,
            threads: config.threads,
        })
    }

    /// Scan every non-hidden file under `root`
    pub fn scan_directory(&self, root: &Path) -> Result<Report, ScanError> {
        let files = collect_files(root)?;
        info!("Scanning {} files under {}", files.len(), root.display());

        let scan_all = || -> Result<Vec<Vec<Finding>>, ScanError> {
            files.par_iter().map(|path| self.scan_file(path)).collect()
        };

        // collect keeps enumeration order regardless of which file finishes first
        let per_file = if self.threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build()?
                .install(scan_all)?
        } else {
            scan_all()?
        };

        let report = Report::new(root.to_path_buf(), per_file);
        info!(
            "Found {} TODOs in {} files",
            report.total_count, report.files_scanned
        );
        Ok(report)
    }

    /// Scan a single file for attributed TODOs
    pub fn scan_file(&self, path: &Path) -> Result<Vec<Finding>, ScanError> {
        let file = File::open(path).map_err(|source| ScanError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let findings = self.scan_lines(path, BufReader::new(file))?;
        debug!("{}: {} TODOs", path.display(), findings.len());
        Ok(findings)
    }

    /// Run the comment state machine over the lines of one file.
    ///
    /// State starts at [`CommentState::Normal`] and never outlives the call,
    /// so an unterminated block comment simply ends with the input.
    pub fn scan_lines<R: BufRead>(
        &self,
        path: &Path,
        mut reader: R,
    ) -> Result<Vec<Finding>, ScanError> {
        let mut findings = Vec::new();
        let mut state = CommentState::Normal;
        let mut line_number = 0;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read =
                read_line(&mut reader, &mut buf).map_err(|source| ScanError::FileRead {
                    path: path.to_path_buf(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            line_number += 1;

            // Binary or mis-encoded files are read lossily rather than rejected
            let line = String::from_utf8_lossy(&buf);
            let outcome = step(&self.patterns, state, &line);
            state = outcome.next;

            if !outcome.is_todo {
                continue;
            }

            match self.blame.attribute(path, line_number) {
                Ok(author) => findings.push(Finding {
                    file_path: path.to_path_buf(),
                    line_number,
                    author,
                    text: line.trim().to_string(),
                }),
                Err(err) if self.skip_unattributed => {
                    warn!("Skipping {}:{}: {}", path.display(), line_number, err);
                }
                Err(source) => {
                    return Err(ScanError::Attribution {
                        path: path.to_path_buf(),
                        line: line_number,
                        source,
                    });
                }
            }
        }

        if state == CommentState::InBlockComment {
            debug!("{}: block comment left open at end of file", path.display());
        }

        Ok(findings)
    }
}

/// Read one line without its terminator (`\n` or `\r\n`)
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<usize> {
    let read = reader.read_until(b'\n', buf)?;
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(read)
}

/// List regular files under `root` in path order, skipping anything with a
/// hidden path segment below the root
pub fn collect_files(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let base = root.to_path_buf();
    let mut walker = WalkBuilder::new(root);
    walker
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let relative = entry.path().strip_prefix(&base).unwrap_or(entry.path());
            !has_hidden_segment(relative)
        });

    let mut files = Vec::new();
    for result in walker.build() {
        let entry = result.map_err(|err| ScanError::FileRead {
            path: root.to_path_buf(),
            source: io::Error::other(err),
        })?;

        // Skip directories and anything that is not a regular file
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        files.push(normalize(entry.path()));
    }

    Ok(files)
}

/// Whether any component of `path` starts with a dot
pub fn has_hidden_segment(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

/// Drop a leading `./` so paths print the way they were named
fn normalize(path: &Path) -> PathBuf {
    path.strip_prefix(".").unwrap_or(path).to_path_buf()
}
