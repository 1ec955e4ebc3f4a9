use std::{
    env,
    ffi::OsString,
    io::{self, Read as _},
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread::sleep,
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

pub const RELOAD_PROGRAM: &str = "glyphterm";
pub const RELOAD_ARGS: [&str; 1] = ["--reload-config"];
/// How long the reload command may run before it is killed.
pub const RELOAD_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadStatus {
    Reloaded,
    Failed,
    Unavailable,
}

/// Asks the running terminal to pick up the new font. Never fatal.
#[derive(Debug, Clone)]
pub struct Reloader {
    program: String,
    args: Vec<String>,
    search_path: Option<OsString>,
    timeout: Duration,
}

impl Default for Reloader {
    fn default() -> Self {
        Self::new(RELOAD_PROGRAM, &RELOAD_ARGS)
    }
}

impl Reloader {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            search_path: None,
            timeout: RELOAD_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Searches `path` instead of `$PATH`.
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    pub fn locate(&self) -> Option<PathBuf> {
        if self.program.contains('/') {
            let path = PathBuf::from(&self.program);
            return is_executable(&path).then_some(path);
        }

        let search_path = self.search_path.clone().or_else(|| env::var_os("PATH"))?;
        env::split_paths(&search_path)
            .map(|dir| dir.join(&self.program))
            .find(|candidate| is_executable(candidate))
    }

    pub fn notify(&self) -> ReloadStatus {
        let Some(program) = self.locate() else {
            info!(
                "{} not found on PATH; restart your terminal to use the new font",
                self.program
            );
            return ReloadStatus::Unavailable;
        };

        debug!("running {} {}", program.display(), self.args.join(" "));
        let child = Command::new(&program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn();

        match child.and_then(|child| wait_with_deadline(child, self.timeout)) {
            Ok(Some((status, _))) if status.success() => {
                info!("Terminal configuration reloaded");
                ReloadStatus::Reloaded
            }
            Ok(Some((status, stderr))) => {
                warn!(
                    "{} exited with {status}; restart your terminal to use the new font",
                    self.program
                );
                if !stderr.trim().is_empty() {
                    debug!("{}", stderr.trim());
                }
                ReloadStatus::Failed
            }
            Ok(None) => {
                warn!(
                    "{} did not finish within {}s; restart your terminal to use the new font",
                    self.program,
                    self.timeout.as_secs()
                );
                ReloadStatus::Failed
            }
            Err(err) => {
                warn!(
                    "Failed to run {}: {err}; restart your terminal to use the new font",
                    program.display()
                );
                ReloadStatus::Failed
            }
        }
    }
}

/// Waits for `child` until `timeout` elapses. Returns `None` after killing a child that
/// overran the deadline.
fn wait_with_deadline(
    mut child: Child,
    timeout: Duration,
) -> io::Result<Option<(ExitStatus, String)>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            return Ok(Some((status, stderr)));
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        sleep(POLL_INTERVAL);
    }
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
