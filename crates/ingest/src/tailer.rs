//! Per-file tail worker.
//!
//! Follows one file path and turns every newline-terminated line appended
//! after start into a record. Pre-existing content is skipped: the worker
//! tails the future, not the past. Rotation (size shrinking) resets the
//! read offset; deletion parks the worker until the file reappears.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader, SeekFrom};
use tokio::task::JoinHandle;

use loghive_core::{diag, now_secs, LogRecord, Severity};
use loghive_store::LogStore;

/// Poll cadence for size changes.
const POLL_INTERVAL: Duration = Duration::from_millis(200);
/// Backoff after a missing file or a read failure.
const RETRY_DELAY: Duration = Duration::from_secs(1);
/// Lines longer than this are dropped as malformed input.
const MAX_LINE_BYTES: usize = 65536;

pub struct FileTailer {
    store: Arc<LogStore>,
    path: PathBuf,
    display_name: String,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FileTailer {
    /// The display name defaults to the file name and becomes the
    /// category of every record this worker emits.
    pub fn new(store: Arc<LogStore>, path: impl Into<PathBuf>, name: Option<String>) -> Self {
        let path = path.into();
        let display_name = name.unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned())
        });
        Self {
            store,
            path,
            display_name,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Start tailing. If the file does not exist the worker stays
    /// not-running and only a diagnostic is emitted.
    pub fn start(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            return;
        }

        let initial_offset = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(_) => {
                diag::error(
                    "FileTailer",
                    &format!("file not found: {}", self.path.display()),
                );
                return;
            }
        };

        self.running.store(true, Ordering::SeqCst);
        diag::log(
            "FileTailer",
            &format!(
                "started tailing {} (as {})",
                self.path.display(),
                self.display_name
            ),
        );

        self.handle = Some(tokio::spawn(tail_loop(
            self.store.clone(),
            self.path.clone(),
            self.display_name.clone(),
            self.running.clone(),
            initial_offset,
        )));
    }

    /// Signal the worker and wait for its current iteration to finish.
    pub async fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        diag::log(
            "FileTailer",
            &format!("stopped tailing {}", self.path.display()),
        );
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

async fn tail_loop(
    store: Arc<LogStore>,
    path: PathBuf,
    display_name: String,
    running: Arc<AtomicBool>,
    mut offset: u64,
) {
    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(POLL_INTERVAL).await;
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let size = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(_) => {
                // Deleted; wait for it to reappear.
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        if size < offset {
            diag::log(
                "FileTailer",
                &format!("file rotated, resetting position: {}", path.display()),
            );
            offset = 0;
        }

        if size > offset {
            match read_new_lines(&store, &path, &display_name, offset).await {
                Ok(new_offset) => offset = new_offset,
                Err(e) => {
                    diag::error("FileTailer", &format!("error reading file: {e}"));
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }
}

/// Read complete lines from `offset`, inserting one record per non-empty
/// line. Returns the offset just past the last newline consumed; a
/// trailing partial line is left for the next poll.
async fn read_new_lines(
    store: &LogStore,
    path: &Path,
    display_name: &str,
    mut offset: u64,
) -> std::io::Result<u64> {
    let mut file = File::open(path).await?;
    file.seek(SeekFrom::Start(offset)).await?;
    let mut reader = BufReader::new(file);

    let mut line = String::new();
    loop {
        line.clear();
        let read = reader.read_line(&mut line).await?;
        if read == 0 || !line.ends_with('\n') {
            break;
        }
        offset += read as u64;

        let text = line.trim_end_matches(['\n', '\r']);
        if text.is_empty() {
            continue;
        }
        if text.len() > MAX_LINE_BYTES {
            diag::error(
                "FileTailer",
                &format!("dropped over-long line ({} bytes) from {}", text.len(), path.display()),
            );
            continue;
        }

        let now = now_secs();
        let record = LogRecord {
            source: "file-tailer".to_string(),
            category: display_name.to_string(),
            verbosity: Severity::Log,
            message: text.to_string(),
            timestamp: now,
            received_at: now,
            session_id: String::new(),
            instance_id: String::new(),
            ..LogRecord::default()
        };
        if let Err(e) = store.insert(&record) {
            diag::error("FileTailer", &format!("failed to store line: {e}"));
        }
    }

    Ok(offset)
}
