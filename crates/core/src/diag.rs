//! Process-wide diagnostic channel with a pluggable sink.
//!
//! Ingest workers and the transport report operational events here rather
//! than straight to a logger, so an embedding application (a terminal UI,
//! for instance) can capture them. With no sink installed, messages flow
//! through `tracing`.

use std::sync::{Arc, RwLock};

/// Delivery target for diagnostic messages.
pub trait DiagSink: Send + Sync {
    fn log(&self, component: &str, message: &str);
    fn error(&self, component: &str, message: &str);
}

static SINK: RwLock<Option<Arc<dyn DiagSink>>> = RwLock::new(None);

/// Install a sink, replacing the current one. Blocks concurrent log calls
/// until installation completes.
pub fn set_sink(sink: Arc<dyn DiagSink>) {
    *SINK.write().expect("diag sink lock poisoned") = Some(sink);
}

/// Remove the installed sink, restoring tracing delivery.
pub fn clear_sink() {
    *SINK.write().expect("diag sink lock poisoned") = None;
}

pub fn log(component: &str, message: &str) {
    match &*SINK.read().expect("diag sink lock poisoned") {
        Some(sink) => sink.log(component, message),
        None => tracing::info!(component, "{message}"),
    }
}

pub fn error(component: &str, message: &str) {
    match &*SINK.read().expect("diag sink lock poisoned") {
        Some(sink) => sink.error(component, message),
        None => tracing::error!(component, "{message}"),
    }
}

/// Plain stdout/stderr sink with `[component]` tags, for running without
/// a terminal UI.
pub struct ConsoleSink;

impl DiagSink for ConsoleSink {
    fn log(&self, component: &str, message: &str) {
        println!("[{component}] {message}");
    }

    fn error(&self, component: &str, message: &str) {
        eprintln!("[{component}] {message}");
    }
}
