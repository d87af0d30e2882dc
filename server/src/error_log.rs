use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Append-only failure log, one line per failed request:
/// `<timestamp> || <public message> || <internal detail>`.
///
/// Never read back. A failed write is reported through `log` and otherwise
/// ignored, the request has already failed.
#[derive(Clone)]
pub struct ErrorLog {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ErrorLog {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, public: &str, detail: &str) {
        let line = format_line(&Local::now().to_string(), public, detail);
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(e) = result {
            log::error!("Failed to write error log {}: {}", self.path.display(), e);
        }
    }

    /// Appends on the blocking pool so slow disks don't stall the runtime.
    pub async fn record(&self, public: &str, detail: &str) {
        let log = self.clone();
        let (public, detail) = (public.to_string(), detail.to_string());
        if let Err(e) = tokio::task::spawn_blocking(move || log.append(&public, &detail)).await {
            log::error!("Error log task failed: {}", e);
        }
    }
}

fn format_line(timestamp: &str, public: &str, detail: &str) -> String {
    // keep one entry per line
    let detail = detail.replace(['\n', '\r'], " ");
    format!("{} || {} || {}\n", timestamp, public, detail)
}
