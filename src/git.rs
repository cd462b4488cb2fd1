use crate::error::AttributionError;
use crate::models::{BlameBackend, Config};
use git2::{BlameOptions, Repository};
use log::{debug, trace};
use std::collections::HashMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Resolves the author of the commit that last touched a line
pub trait BlameSource: Send + Sync {
    fn attribute(&self, file_path: &Path, line_number: usize) -> Result<String, AttributionError>;
}

/// Build the blame source selected by the configuration
pub fn blame_source_for(
    config: &Config,
    scan_root: &Path,
) -> Result<Box<dyn BlameSource>, AttributionError> {
    match config.blame_backend {
        BlameBackend::Cli => Ok(Box::new(GitCliBlame::new(Duration::from_secs(
            config.blame_timeout_secs,
        )))),
        BlameBackend::Libgit2 => Ok(Box::new(Git2Blame::discover(scan_root)?)),
    }
}

/// Attribution through the `git` executable: one `blame` and one `show` per line
#[derive(Debug, Clone)]
pub struct GitCliBlame {
    timeout: Duration,
}

impl GitCliBlame {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl BlameSource for GitCliBlame {
    fn attribute(&self, file_path: &Path, line_number: usize) -> Result<String, AttributionError> {
        // Run from the file's own directory so the right repository is picked up
        // no matter where the scan was started from
        let dir = match file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file_name = file_path.file_name().unwrap_or(file_path.as_os_str());

        let range = format!("{},{}", line_number, line_number);
        let mut blame = Command::new("git");
        blame
            .args(["blame", "-L", range.as_str(), "--"])
            .arg(file_name)
            .current_dir(dir);
        let blame_output = run_with_timeout(blame, self.timeout)?;

        let commit = parse_blame_commit(&blame_output).ok_or_else(|| {
            AttributionError::MissingCommit {
                path: file_path.to_path_buf(),
                line: line_number,
            }
        })?;
        trace!("{}:{} last touched by {}", file_path.display(), line_number, commit);

        let mut show = Command::new("git");
        show.args(["show", "-s", "--format=%an", commit]).current_dir(dir);
        let author = run_with_timeout(show, self.timeout)?;

        Ok(author.trim().to_string())
    }
}

/// Pull the commit hash out of `git blame` output.
///
/// The hash is the first whitespace-delimited token; boundary commits carry a
/// leading `^` which is dropped.
pub fn parse_blame_commit(output: &str) -> Option<&str> {
    let token = output.split_whitespace().next()?;
    let commit = token.strip_prefix('^').unwrap_or(token);
    if commit.is_empty() { None } else { Some(commit) }
}

/// Run a command to completion and return its stdout, killing it once the
/// timeout elapses
fn run_with_timeout(mut command: Command, timeout: Duration) -> Result<String, AttributionError> {
    let display = describe(&command);
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| AttributionError::Spawn {
            command: display.clone(),
            source,
        })?;

    // Both pipes are drained while waiting, otherwise a long blamed line
    // fills the pipe and the child never exits
    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        let polled = child.try_wait().map_err(|source| AttributionError::Spawn {
            command: display.clone(),
            source,
        })?;
        if let Some(status) = polled {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(AttributionError::Timeout {
                command: display,
                timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = join_drain(stdout_reader).map_err(|source| AttributionError::Spawn {
        command: display.clone(),
        source,
    })?;
    let stderr = join_drain(stderr_reader).unwrap_or_default();

    if !status.success() {
        return Err(AttributionError::Failed {
            command: display,
            status: status.to_string(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join_drain(handle: JoinHandle<io::Result<Vec<u8>>>) -> io::Result<Vec<u8>> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("pipe reader panicked")))
}

fn describe(command: &Command) -> String {
    let mut parts = vec![command.get_program().to_string_lossy().into_owned()];
    parts.extend(command.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// In-process attribution through libgit2
pub struct Git2Blame {
    repo: Mutex<Repository>,
}

impl Git2Blame {
    /// Open the repository containing `path`
    pub fn discover(path: &Path) -> Result<Self, AttributionError> {
        let repo = Repository::discover(path)?;
        debug!("Using repository at {}", repo.path().display());
        Ok(Self {
            repo: Mutex::new(repo),
        })
    }
}

impl BlameSource for Git2Blame {
    fn attribute(&self, file_path: &Path, line_number: usize) -> Result<String, AttributionError> {
        let repo = self.repo.lock().map_err(|_| AttributionError::Poisoned)?;

        // Get the file path relative to the repository root
        let workdir = repo.workdir().ok_or_else(|| {
            git2::Error::from_str("repository has no working directory")
        })?;
        let absolute = file_path
            .canonicalize()
            .unwrap_or_else(|_| file_path.to_path_buf());
        let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
        let relative_path = absolute.strip_prefix(&workdir).unwrap_or(file_path);

        let mut opts = BlameOptions::new();
        let blame = repo.blame_file(relative_path, Some(&mut opts))?;

        let hunk = blame
            .get_line(line_number)
            .ok_or_else(|| AttributionError::MissingCommit {
                path: file_path.to_path_buf(),
                line: line_number,
            })?;

        let commit = repo.find_commit(hunk.final_commit_id())?;
        let author = commit.author();
        Ok(author.name().unwrap_or("Unknown").trim().to_string())
    }
}

/// Fixed attribution table, for scanning without a repository
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlame {
    authors: HashMap<(PathBuf, usize), String>,
}

impl InMemoryBlame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_author(
        mut self,
        file_path: impl Into<PathBuf>,
        line_number: usize,
        author: impl Into<String>,
    ) -> Self {
        self.authors
            .insert((file_path.into(), line_number), author.into());
        self
    }
}

impl BlameSource for InMemoryBlame {
    fn attribute(&self, file_path: &Path, line_number: usize) -> Result<String, AttributionError> {
        self.authors
            .get(&(file_path.to_path_buf(), line_number))
            .cloned()
            .ok_or_else(|| AttributionError::NotFound {
                path: file_path.to_path_buf(),
                line: line_number,
            })
    }
}
