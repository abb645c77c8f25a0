//! Lifecycle registry for file-tail workers.
//!
//! Sources are addressed by opaque ids of the form `file-<N>`; the
//! counter is monotone for the life of the manager, so removed ids are
//! never reused.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use loghive_core::SourceInfo;
use loghive_store::LogStore;

use crate::tailer::FileTailer;

pub struct SourceManager {
    store: Arc<LogStore>,
    inner: Mutex<Inner>,
}

struct Inner {
    next_id: u64,
    tailers: HashMap<String, FileTailer>,
}

impl SourceManager {
    pub fn new(store: Arc<LogStore>) -> Self {
        Self {
            store,
            inner: Mutex::new(Inner {
                next_id: 1,
                tailers: HashMap::new(),
            }),
        }
    }

    /// Start a tail worker for `path`. Returns its id, or `None` when the
    /// worker failed to start (file missing); the failed worker is
    /// dropped.
    pub async fn add_file(&self, path: impl AsRef<Path>, name: Option<String>) -> Option<String> {
        let mut inner = self.inner.lock().await;

        let id = format!("file-{}", inner.next_id);
        inner.next_id += 1;

        let mut tailer = FileTailer::new(self.store.clone(), path.as_ref(), name);
        tailer.start();
        if !tailer.is_running() {
            return None;
        }

        inner.tailers.insert(id.clone(), tailer);
        Some(id)
    }

    /// Stop and forget a source. Returns false for unknown ids.
    pub async fn remove(&self, id: &str) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.tailers.remove(id) {
            Some(mut tailer) => {
                tailer.stop().await;
                true
            }
            None => false,
        }
    }

    /// Snapshot descriptors for every registered source.
    pub async fn list(&self) -> Vec<SourceInfo> {
        let inner = self.inner.lock().await;
        let mut sources: Vec<SourceInfo> = inner
            .tailers
            .iter()
            .map(|(id, tailer)| SourceInfo {
                id: id.clone(),
                kind: "file-tailer",
                display_name: tailer.display_name().to_string(),
                path: tailer.path().to_string_lossy().into_owned(),
                running: tailer.is_running(),
            })
            .collect();
        sources.sort_by(|a, b| a.id.cmp(&b.id));
        sources
    }

    /// Stop every worker; used at teardown.
    pub async fn stop_all(&self) {
        let mut inner = self.inner.lock().await;
        for (_, mut tailer) in inner.tailers.drain() {
            tailer.stop().await;
        }
    }
}
