//! Server-sent event streams, one per connected MCP client.
//!
//! Each stream gets an opaque session id and a dedicated channel; all
//! frames for one client flow through that single channel, so writes can
//! never interleave. The first frame is always the `endpoint` event
//! telling the client where to POST its messages.

use std::collections::HashMap;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use loghive_core::diag;

use crate::state::AppState;

/// Frames buffered per client before a slow stream exerts back-pressure
/// on POST handlers.
const CLIENT_BUFFER: usize = 32;

type EventSender = mpsc::Sender<Result<Event, Infallible>>;
type ClientMap = Arc<Mutex<HashMap<String, EventSender>>>;

/// Registry of connected event-stream clients, keyed by session id.
pub struct SseRegistry {
    clients: ClientMap,
    counter: AtomicU64,
}

impl Default for SseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SseRegistry {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            counter: AtomicU64::new(0),
        }
    }

    fn next_session_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let suffix = Uuid::new_v4().simple().to_string();
        format!("session_{n}_{}", &suffix[..8])
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().expect("sse client set poisoned").len()
    }

    /// Send one frame to the client with this session id. Returns false
    /// when no such client is connected; a dead client is dropped from
    /// the registry.
    pub async fn send_to(&self, session_id: &str, event: &str, data: String) -> bool {
        let sender = {
            let clients = self.clients.lock().expect("sse client set poisoned");
            clients.get(session_id).cloned()
        };
        let Some(sender) = sender else {
            return false;
        };

        let frame = Event::default().event(event).data(data);
        if sender.send(Ok(frame)).await.is_err() {
            self.clients
                .lock()
                .expect("sse client set poisoned")
                .remove(session_id);
            return false;
        }
        true
    }

    /// Send one frame to every connected client.
    pub async fn broadcast(&self, event: &str, data: String) {
        let targets: Vec<(String, EventSender)> = {
            let clients = self.clients.lock().expect("sse client set poisoned");
            clients
                .iter()
                .map(|(id, tx)| (id.clone(), tx.clone()))
                .collect()
        };

        for (session_id, sender) in targets {
            let frame = Event::default().event(event).data(data.clone());
            if sender.send(Ok(frame)).await.is_err() {
                self.clients
                    .lock()
                    .expect("sse client set poisoned")
                    .remove(&session_id);
            }
        }
    }
}

/// A client's event stream; deregisters itself when dropped.
pub struct ClientStream {
    inner: ReceiverStream<Result<Event, Infallible>>,
    clients: ClientMap,
    session_id: String,
}

impl Stream for ClientStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

impl Drop for ClientStream {
    fn drop(&mut self) {
        self.clients
            .lock()
            .expect("sse client set poisoned")
            .remove(&self.session_id);
        diag::log("HTTP", &format!("SSE client disconnected: {}", self.session_id));
    }
}

/// `GET /` and `GET /sse`: open the per-client event stream.
///
/// The first frame names the companion POST endpoint; afterwards the
/// stream idles on comment keep-alives until the dispatcher has
/// responses to push.
pub async fn sse_handler(State(state): State<Arc<AppState>>) -> Sse<KeepAliveStream<ClientStream>> {
    let session_id = state.sse.next_session_id();
    diag::log("HTTP", &format!("SSE client connected: {session_id}"));

    let (tx, rx) = mpsc::channel(CLIENT_BUFFER);

    // Queue the handshake before the client can observe the stream.
    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages?session_id={session_id}"));
    let _ = tx.try_send(Ok(endpoint));

    state
        .sse
        .clients
        .lock()
        .expect("sse client set poisoned")
        .insert(session_id.clone(), tx);

    let stream = ClientStream {
        inner: ReceiverStream::new(rx),
        clients: state.sse.clients.clone(),
        session_id,
    };

    // Leading space matters: the wire frame must read `: ping\n\n`.
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text(" ping"),
    )
}
