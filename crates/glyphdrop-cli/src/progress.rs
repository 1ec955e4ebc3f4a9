use std::{
    sync::{LazyLock, Mutex, PoisonError},
    time::Duration,
};

use glyphdrop_dl::types::Progress;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::utils::progress_enabled;

static MULTI: LazyLock<MultiProgress> = LazyLock::new(MultiProgress::new);

/// Pause progress display, run the closure, then resume.
pub fn suspend<F: FnOnce() -> R, R>(f: F) -> R {
    MULTI.suspend(f)
}

/// Stop and clear all progress bars.
pub fn stop() {
    MULTI.clear().ok();
}

fn download_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.cyan} {prefix}  {wide_bar:.cyan/dim}  {bytes}/{total_bytes}  {bytes_per_sec}  {eta}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("━━─")
}

/// Create a download progress bar with a progress bar, bytes, and ETA.
pub fn create_download_job(prefix: &str) -> ProgressBar {
    let pb = if progress_enabled() {
        MULTI.add(ProgressBar::new(0))
    } else {
        MULTI.add(ProgressBar::hidden())
    };
    pb.set_style(download_style());
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Handle download progress events and update a progress bar.
pub fn handle_download_progress(state: Progress, pb: &ProgressBar) {
    match state {
        Progress::Starting { total } => {
            pb.set_length(total);
            pb.set_position(0);
        }
        Progress::Chunk { current, .. } => {
            pb.set_position(current);
        }
        Progress::Complete { .. } => {
            pb.finish_and_clear();
        }
    }
}

/// Progress callback for the archive transport. The bar appears on the first
/// event, so metadata requests and cache hits stay silent.
pub fn download_reporter(prefix: &str) -> impl Fn(Progress) + Send + Sync + 'static {
    let prefix = prefix.to_string();
    let bar: Mutex<Option<ProgressBar>> = Mutex::new(None);

    move |state| {
        let mut bar = bar.lock().unwrap_or_else(PoisonError::into_inner);
        let pb = bar.get_or_insert_with(|| create_download_job(&prefix));
        handle_download_progress(state, pb);
        if matches!(state, Progress::Complete { .. }) {
            *bar = None;
        }
    }
}
