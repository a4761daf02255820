//! Per-session actors.
//!
//! Each live connection gets one task that owns its view. Client actions and
//! timer ticks go through the same `select!` loop, so they are processed one at
//! a time. Every processed event renders a fresh snapshot onto the transport
//! channel. The actor stops, and its ticker with it, as soon as the transport
//! receiver or the last command sender is dropped, or when it is closed
//! explicitly because a reconnect took over its id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use guestbook_core::{LiveView, ViewEvent};
use guestbook_dom::Snapshot;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

const COMMAND_BUFFER: usize = 32;

/// Snapshots not yet written to the transport
pub const SNAPSHOT_BUFFER: usize = 32;

enum Command {
    Event {
        event: ViewEvent,
        reply: oneshot::Sender<Snapshot>,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("session closed")]
pub struct SessionClosed;

/// Cheap, cloneable address of a running session actor.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    stop: Arc<Notify>,
}

impl SessionHandle {
    /// Deliver an event and wait for the snapshot rendered after it.
    pub async fn dispatch(&self, event: ViewEvent) -> Result<Snapshot, SessionClosed> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Event { event, reply })
            .await
            .map_err(|_| SessionClosed)?;
        rx.await.map_err(|_| SessionClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Stop the actor. Its transport is dropped, which ends the stream.
    pub fn close(&self) {
        self.stop.notify_one();
    }

    /// True when both handles address the same actor.
    pub fn same_actor(&self, other: &SessionHandle) -> bool {
        self.commands.same_channel(&other.commands)
    }
}

/// Start an actor for `view`. The initial snapshot is pushed to `transport`
/// before any event is processed.
pub fn spawn_session<V: LiveView>(
    session: String,
    view: V,
    transport: mpsc::Sender<Snapshot>,
) -> (SessionHandle, JoinHandle<()>) {
    let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
    let stop = Arc::new(Notify::new());
    let task = tokio::spawn(run(session, view, rx, transport, stop.clone()));
    (SessionHandle { commands, stop }, task)
}

async fn run<V: LiveView>(
    session: String,
    mut view: V,
    mut commands: mpsc::Receiver<Command>,
    transport: mpsc::Sender<Snapshot>,
    stop: Arc<Notify>,
) {
    if transport.send(Snapshot::new(view.render())).await.is_err() {
        return;
    }

    let mut ticker = view.tick_interval().map(|period| {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    loop {
        let snapshot = tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Event { event, reply }) => {
                    tracing::debug!(session = %session, action = event.name(), "handling event");
                    view.handle_event(event);
                    let snapshot = Snapshot::new(view.render());
                    // The caller may have given up waiting; the push still goes out.
                    let _ = reply.send(snapshot.clone());
                    snapshot
                }
                None => break,
            },
            _ = next_tick(&mut ticker) => {
                view.handle_event(ViewEvent::Tick);
                Snapshot::new(view.render())
            }
            _ = transport.closed() => break,
            _ = stop.notified() => break,
        };

        if transport.send(snapshot).await.is_err() {
            break;
        }
    }

    tracing::debug!(session = %session, "session actor stopped");
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Live sessions by id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session, replacing whatever held the id. Returns the
    /// replaced handle if its actor was still running.
    pub fn insert(&self, id: &str, handle: SessionHandle) -> Option<SessionHandle> {
        self.lock()
            .insert(id.to_string(), handle)
            .filter(|previous| !previous.is_closed())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().get(id).is_some_and(|h| !h.is_closed())
    }

    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.lock().get(id).cloned()
    }

    /// Remove the entry only while it still points at `handle`'s actor.
    pub fn remove_if_current(&self, id: &str, handle: &SessionHandle) -> bool {
        let mut sessions = self.lock();
        if sessions.get(id).is_some_and(|h| h.same_actor(handle)) {
            sessions.remove(id);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionHandle>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guestbook_core::{
        ConnectionState, EntryForm, EntryStore, GuestBookView, GuestTable, RandomSource,
    };
    use std::sync::Arc;
    use std::time::Duration;

    /// Always returns `low`.
    struct Lowest;

    impl RandomSource for Lowest {
        fn range(&mut self, low: u32, _high: u32) -> u32 {
            low
        }
    }

    fn visitors(snapshot: &Snapshot) -> String {
        snapshot
            .root
            .find_key("visitors")
            .and_then(|n| n.text.clone())
            .unwrap_or_default()
    }

    fn connected_view(store: Arc<GuestTable>) -> GuestBookView {
        GuestBookView::mount(store, Box::new(Lowest), ConnectionState::Connected)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_interval() {
        let store = Arc::new(GuestTable::new());
        let (tx, mut rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let (_handle, _task) = spawn_session("s1".into(), connected_view(store), tx);

        assert_eq!(visitors(&rx.recv().await.unwrap()), "Visitors: 500");

        let start = Instant::now();
        assert_eq!(visitors(&rx.recv().await.unwrap()), "Visitors: 501");
        assert_eq!(start.elapsed(), Duration::from_millis(5000));
        assert_eq!(visitors(&rx.recv().await.unwrap()), "Visitors: 502");
        assert_eq!(start.elapsed(), Duration::from_millis(10000));
    }

    #[tokio::test]
    async fn test_dispatch_replies_and_pushes() {
        let store = Arc::new(GuestTable::new());
        let (tx, mut rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let (handle, _task) = spawn_session("s2".into(), connected_view(store.clone()), tx);
        let _initial = rx.recv().await.unwrap();

        let reply = handle
            .dispatch(ViewEvent::Submit(EntryForm::new("Alice", "Hi!")))
            .await
            .unwrap();
        let pushed = rx.recv().await.unwrap();
        assert_eq!(reply, pushed);

        let id = store.list_recent(1)[0].id;
        assert!(reply.root.find_key(&format!("entry-{id}")).is_some());
    }

    #[tokio::test]
    async fn test_dropping_transport_stops_actor() {
        let store = Arc::new(GuestTable::new());
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let (handle, task) = spawn_session("s3".into(), connected_view(store), tx);
        drop(rx);

        task.await.unwrap();
        assert!(handle.is_closed());
        assert!(handle.dispatch(ViewEvent::Clear).await.is_err());
    }

    #[tokio::test]
    async fn test_dropping_last_handle_stops_actor() {
        let store = Arc::new(GuestTable::new());
        let (tx, mut rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let (handle, task) = spawn_session("s4".into(), connected_view(store), tx);
        let _initial = rx.recv().await.unwrap();
        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_stops_actor_and_transport() {
        let store = Arc::new(GuestTable::new());
        let (tx, mut rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let (handle, task) = spawn_session("s5".into(), connected_view(store), tx);
        let _initial = rx.recv().await.unwrap();

        handle.close();
        task.await.unwrap();
        assert!(rx.recv().await.is_none());
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_registry_replaces_live_session() {
        let registry = SessionRegistry::new();
        let store = Arc::new(GuestTable::new());
        let (tx, _rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let (first, _t1) = spawn_session("dup".into(), connected_view(store.clone()), tx.clone());
        let (second, _t2) = spawn_session("dup".into(), connected_view(store), tx);

        assert!(registry.insert("dup", first.clone()).is_none());
        assert!(registry.contains("dup"));
        let replaced = registry.insert("dup", second.clone()).expect("first was live");
        assert!(replaced.same_actor(&first));
        assert!(!replaced.same_actor(&second));

        // The stale stream going away must not unregister its successor
        assert!(!registry.remove_if_current("dup", &first));
        assert!(registry.get("dup").is_some_and(|h| h.same_actor(&second)));
        assert!(registry.remove_if_current("dup", &second));
        assert!(registry.is_empty());
    }
}
