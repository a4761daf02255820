use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::Stream;
use guestbook_core::{
    ConnectionState, EmbeddedGuestBook, GuestBookView, GuestTable, HostConfig, LiveView,
    RandomSource, ThreadRandom, ViewEvent,
};
use guestbook_dom::{DomNode, Snapshot};
use guestbook_render_html::{render_page, PageOptions};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::session::{spawn_session, SessionHandle, SessionRegistry, SNAPSHOT_BUFFER};

/// Client runtime, embedded at compile time
const CLIENT_JS: &str = include_str!("../assets/guestbook.js");
const STYLE_CSS: &str = include_str!("../assets/style.css");

const SESSION_ID_LEN: usize = 12;
const MAX_SESSION_ID_LEN: usize = 64;
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

// ── Shared state ────────────────────────────────────────────────────

pub type RandomFactory = Arc<dyn Fn() -> Box<dyn RandomSource> + Send + Sync>;

pub struct AppState {
    pub store: Arc<GuestTable>,
    pub sessions: SessionRegistry,
    pub config: ServerConfig,
    random: RandomFactory,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        AppState {
            store: Arc::new(GuestTable::new()),
            sessions: SessionRegistry::new(),
            config,
            random: Arc::new(|| Box::new(ThreadRandom::new()) as Box<dyn RandomSource>),
            shutdown: watch::channel(false).0,
        }
    }

    /// Replace the random source handed to every standalone mount.
    pub fn with_random(mut self, factory: RandomFactory) -> Self {
        self.random = factory;
        self
    }

    /// End every open live stream so the server can drain.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    fn standalone_view(&self, connection: ConnectionState) -> GuestBookView {
        GuestBookView::mount(self.store.clone(), (self.random)(), connection)
            .with_tick_interval(self.config.tick_interval)
            .with_title(self.config.title.as_str())
    }
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/embed", get(embed))
        .route("/sse", get(connect))
        .route("/actions/:name", post(action))
        .route("/guestbook.js", get(client_script))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Request / Response types ────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub app: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    #[default]
    Standalone,
    Embed,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbedQuery {
    pub id: Option<String>,
    #[serde(alias = "hostApp")]
    pub host_app: Option<String>,
    pub theme: Option<String>,
}

impl EmbedQuery {
    /// Host configuration for a fresh mount. The instance `id` is required.
    fn host_config(&self) -> Result<HostConfig, AppError> {
        let id = match self.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(AppError::BadRequest("embedded guest book requires an id".into())),
        };
        Ok(HostConfig {
            id,
            host_app: self.host_app.clone(),
            theme: self.theme.clone(),
        })
    }

    fn query_string(&self) -> String {
        [("id", &self.id), ("host_app", &self.host_app), ("theme", &self.theme)]
            .into_iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| format!("&{}={}", k, encode_component(v))))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub session: String,
    #[serde(default)]
    pub view: ViewKind,
    pub id: Option<String>,
    #[serde(alias = "hostApp")]
    pub host_app: Option<String>,
    pub theme: Option<String>,
}

impl ConnectQuery {
    fn embed(&self) -> EmbedQuery {
        EmbedQuery {
            id: self.id.clone(),
            host_app: self.host_app.clone(),
            theme: self.theme.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    pub session: String,
}

// ── Handlers: pages ─────────────────────────────────────────────────

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        app: "demo_phoenix",
        kind: "phoenix_liveview",
    })
}

/// First paint of the standalone page. Nothing is kept server-side until the
/// client opens its stream.
async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let session = generate_session_id();
    let view = state.standalone_view(ConnectionState::Disconnected);
    let sse_url = format!("/sse?session={}", session);
    Html(page(&state, view.render(), sse_url, session))
}

async fn embed(
    State(state): State<Arc<AppState>>,
    query: Result<Query<EmbedQuery>, QueryRejection>,
) -> Result<Html<String>, AppError> {
    let Query(query) = query?;
    let component = EmbeddedGuestBook::mount(state.store.clone(), query.host_config()?);
    let session = generate_session_id();
    let sse_url = format!("/sse?session={}&view=embed{}", session, query.query_string());
    Ok(Html(page(&state, component.render(), sse_url, session)))
}

async fn client_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "public, max-age=300, must-revalidate"),
        ],
        CLIENT_JS,
    )
}

fn page(state: &AppState, root: DomNode, sse_url: String, session: String) -> String {
    let mut opts = PageOptions::new(root, &state.config.title);
    opts.inline_css = Some(STYLE_CSS.to_string());
    opts.scripts.push("/guestbook.js".to_string());
    opts.sse_url = Some(sse_url);
    opts.session = Some(session);
    render_page(&opts)
}

// ── Handlers: live session ──────────────────────────────────────────

/// Unregisters the session when its stream is dropped, unless a reconnect
/// has already taken the id over.
struct SessionGuard {
    state: Arc<AppState>,
    session: String,
    handle: SessionHandle,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.state.sessions.remove_if_current(&self.session, &self.handle) {
            info!(
                session = %self.session,
                active = self.state.sessions.len(),
                "session disconnected"
            );
        }
    }
}

/// Live connection handshake: mounts the view connected, starts its actor and
/// streams every snapshot it renders. A reconnect with the id of a session
/// that is still live replaces it and closes the stale stream.
async fn connect(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ConnectQuery>, QueryRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let Query(query) = query?;
    validate_session_id(&query.session)?;

    let (tx, mut rx) = mpsc::channel::<Snapshot>(SNAPSHOT_BUFFER);
    let session = query.session.clone();
    let (handle, _task) = match query.view {
        ViewKind::Standalone => {
            spawn_session(session.clone(), state.standalone_view(ConnectionState::Connected), tx)
        }
        ViewKind::Embed => {
            let config = query.embed().host_config()?;
            spawn_session(session.clone(), EmbeddedGuestBook::mount(state.store.clone(), config), tx)
        }
    };

    if let Some(stale) = state.sessions.insert(&session, handle.clone()) {
        info!(session = %session, "reconnect replaced a live session");
        stale.close();
    }
    info!(
        session = %session,
        view = ?query.view,
        active = state.sessions.len(),
        "session connected"
    );

    let mut shutdown = state.shutdown.subscribe();
    let guard = SessionGuard {
        state: state.clone(),
        session,
        handle,
    };

    let stream = async_stream::stream! {
        let _guard = guard;
        loop {
            let next = tokio::select! {
                snapshot = rx.recv() => snapshot,
                _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => None,
            };
            let Some(snapshot) = next else { break };
            yield Ok::<_, Infallible>(Event::default().event("message").data(snapshot.to_json()));
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEPALIVE_INTERVAL).text("keepalive")))
}

async fn action(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    query: Result<Query<ActionQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Json<Snapshot>, AppError> {
    let Query(query) = query?;
    let payload = parse_payload(&body)?;
    let event = ViewEvent::from_action(&name, payload)?;

    let handle = state
        .sessions
        .get(&query.session)
        .filter(|h| !h.is_closed())
        .ok_or_else(|| AppError::NotFound(format!("unknown session: {}", query.session)))?;

    info!(session = %query.session, action = %name, "action");
    let snapshot = handle
        .dispatch(event)
        .await
        .map_err(|e| AppError::NotFound(format!("{}: {}", e, query.session)))?;
    Ok(Json(snapshot))
}

/// Body is either the payload itself or `{"payload": ...}`. Empty body → null.
fn parse_payload(body: &[u8]) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    let mut value: Value = serde_json::from_slice(body)?;
    if let Some(inner) = value.get_mut("payload") {
        return Ok(inner.take());
    }
    Ok(value)
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Short lowercase alphanumeric id for a new page session.
pub fn generate_session_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..SESSION_ID_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

fn validate_session_id(id: &str) -> Result<(), AppError> {
    let ok = !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("invalid session id: {:?}", id)))
    }
}

fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_health_body() {
        let body = serde_json::to_string(&HealthStatus {
            status: "healthy",
            app: "demo_phoenix",
            kind: "phoenix_liveview",
        })
        .unwrap();
        assert_eq!(body, r#"{"status":"healthy","app":"demo_phoenix","type":"phoenix_liveview"}"#);
    }

    #[test]
    fn test_parse_payload() {
        assert_eq!(parse_payload(b"").unwrap(), Value::Null);
        assert_eq!(parse_payload(b"  \n").unwrap(), Value::Null);
        assert_eq!(parse_payload(br#"{"name":"a"}"#).unwrap(), json!({"name": "a"}));
        assert_eq!(
            parse_payload(br#"{"payload":{"name":"a"}}"#).unwrap(),
            json!({"name": "a"})
        );
        assert!(matches!(parse_payload(b"{nope"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_session_ids() {
        let id = generate_session_id();
        assert_eq!(id.len(), SESSION_ID_LEN);
        assert!(validate_session_id(&id).is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("a b").is_err());
        assert!(validate_session_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_embed_query_string() {
        let query = EmbedQuery {
            id: Some("w1".into()),
            host_app: Some("my shop&co".into()),
            theme: None,
        };
        assert_eq!(query.query_string(), "&id=w1&host_app=my%20shop%26co");
        assert_eq!(EmbedQuery::default().query_string(), "");
    }

    #[test]
    fn test_embed_requires_id() {
        assert!(matches!(EmbedQuery::default().host_config(), Err(AppError::BadRequest(_))));
        let blank = EmbedQuery {
            id: Some(String::new()),
            ..EmbedQuery::default()
        };
        assert!(blank.host_config().is_err());

        let query = EmbedQuery {
            id: Some("w1".into()),
            host_app: Some("shop".into()),
            theme: None,
        };
        let config = query.host_config().unwrap();
        assert_eq!(config.id, "w1");
        assert_eq!(config.host_app.as_deref(), Some("shop"));
        assert_eq!(config.theme, None);
    }
}
