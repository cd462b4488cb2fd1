//! Line-level comment heuristics.
//!
//! Nothing here understands a language grammar. A line is a comment when it
//! contains `//`, `#` or `/* */` anywhere, and opens a block when it contains
//! `/*` without a closer. String literals are not special.

use crate::error::ScanError;
use regex::Regex;

const SINGLE_LINE_COMMENT: &str = r"//.*|#.*|/\*.*\*/";
const BLOCK_OPENER: &str = r"/\*.*";
const BLOCK_CLOSER: &str = r"(?i)\*/.*";
const TODO: &str = r"(?i)todo.*";

/// Result of classifying one line outside a block comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_comment: bool,
    pub opens_unclosed_block: bool,
}

/// Compiled comment and TODO patterns, built once per process
#[derive(Debug, Clone)]
pub struct CommentPatterns {
    single_line: Regex,
    block_opener: Regex,
    block_closer: Regex,
    todo: Regex,
}

impl CommentPatterns {
    pub fn compile() -> Result<Self, ScanError> {
        Ok(Self {
            single_line: compile(SINGLE_LINE_COMMENT)?,
            block_opener: compile(BLOCK_OPENER)?,
            block_closer: compile(BLOCK_CLOSER)?,
            todo: compile(TODO)?,
        })
    }

    /// Decide whether a line holds a comment and whether it leaves a block open
    pub fn classify(&self, line: &str) -> Classification {
        if self.single_line.is_match(line) {
            return Classification {
                is_comment: true,
                opens_unclosed_block: false,
            };
        }

        let opens = self.block_opener.is_match(line);
        Classification {
            is_comment: opens,
            opens_unclosed_block: opens,
        }
    }

    /// Whether a line inside an open block comment closes it.
    ///
    /// Anything after the `*/` is not looked at again.
    pub fn closes_block(&self, line: &str) -> bool {
        self.block_closer.is_match(line)
    }

    pub fn has_todo(&self, line: &str) -> bool {
        self.todo.is_match(line)
    }
}

fn compile(pattern: &'static str) -> Result<Regex, ScanError> {
    Regex::new(pattern).map_err(|source| ScanError::PatternCompile { pattern, source })
}
