use std::{
    fs::File,
    io::{Read as _, Write as _},
    path::Path,
    sync::Arc,
    thread::sleep,
    time::Duration,
};

use glyphdrop_utils::error::FileSystemError;
use tracing::{debug, warn};
use ureq::http::header::CONTENT_LENGTH;

use crate::{error::DownloadError, http::Http, types::Progress};

/// Moves the bytes behind a URL into a local file.
pub trait Transport {
    /// Downloads `url` into `dest`, truncating it first. Returns the number of bytes written.
    fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        (**self).download(url, dest)
    }
}

/// Fixed-count, fixed-delay retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Outcome of a single network attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    Done(T),
    Retry(DownloadError),
    Fatal(DownloadError),
}

impl<T> From<Result<T, DownloadError>> for Attempt<T> {
    /// Network failures, interrupted bodies, `429` and `5xx` are worth another try; anything
    /// else, including local file errors and plain-http rejections, will fail the same way again.
    fn from(result: Result<T, DownloadError>) -> Self {
        match result {
            Ok(value) => Attempt::Done(value),
            Err(err) => {
                match err {
                    DownloadError::Network(ref e)
                        if matches!(**e, ureq::Error::RequireHttpsOnly(_)) =>
                    {
                        Attempt::Fatal(err)
                    }
                    DownloadError::Network(_) | DownloadError::Io(_) => Attempt::Retry(err),
                    DownloadError::HttpError {
                        status, ..
                    } if status == 429 || status >= 500 => Attempt::Retry(err),
                    _ => Attempt::Fatal(err),
                }
            }
        }
    }
}

/// Runs `op` until it succeeds, fails fatally, or the policy runs out of attempts.
pub fn with_retry<T, F>(url: &str, policy: &RetryPolicy, mut op: F) -> Result<T, DownloadError>
where
    F: FnMut() -> Attempt<T>,
{
    let attempts = policy.attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match op() {
            Attempt::Done(value) => return Ok(value),
            Attempt::Fatal(err) => return Err(err),
            Attempt::Retry(err) => {
                warn!("Attempt {attempt}/{attempts} for {url} failed: {err}");
                last_error = Some(err);
                if attempt < attempts {
                    sleep(policy.delay);
                }
            }
        }
    }

    Err(DownloadError::RetriesExhausted {
        url: url.to_string(),
        attempts,
        last: last_error.map(|e| e.to_string()).unwrap_or_default(),
    })
}

/// [`Transport`] over the shared HTTPS agent.
#[derive(Clone, Default)]
pub struct HttpTransport {
    retry: RetryPolicy,
    on_progress: Option<Arc<dyn Fn(Progress) + Send + Sync>>,
}

impl HttpTransport {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            retry,
            on_progress: None,
        }
    }

    /// Registers a callback invoked with [`Progress`] events for every attempt.
    pub fn progress<F>(mut self, f: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(f));
        self
    }

    fn download_once(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let resp = Http::fetch(url)?;

        let total = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|h| h.to_str().ok())
            .and_then(|len| len.parse::<u64>().ok())
            .unwrap_or(0);

        if let Some(ref cb) = self.on_progress {
            cb(Progress::Starting {
                total,
            });
        }

        let write_error = |source: std::io::Error| {
            DownloadError::FileSystem(FileSystemError::File {
                path: dest.to_path_buf(),
                action: "write",
                source,
            })
        };
        let mut file = File::create(dest).map_err(write_error)?;
        let mut reader = resp.into_body().into_reader();
        let mut buffer = [0u8; 8192];
        let mut downloaded = 0u64;

        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }

            file.write_all(&buffer[..n]).map_err(write_error)?;
            downloaded += n as u64;

            if let Some(ref cb) = self.on_progress {
                cb(Progress::Chunk {
                    current: downloaded,
                    total,
                });
            }
        }
        file.flush().map_err(write_error)?;

        if let Some(ref cb) = self.on_progress {
            cb(Progress::Complete {
                total: downloaded,
            });
        }

        debug!("Downloaded {downloaded} bytes from {url}");
        Ok(downloaded)
    }
}

impl Transport for HttpTransport {
    fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        with_retry(url, &self.retry, || self.download_once(url, dest).into())
    }
}
