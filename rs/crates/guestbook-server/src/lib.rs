//! guestbook-server — live guest book over HTTP/SSE
//!
//!   GET  /                 server-rendered standalone page (opens a session)
//!   GET  /embed            server-rendered embeddable component
//!   GET  /sse?session=…    live stream; spawns the session actor
//!   POST /actions/<name>   submit | clear | refresh | update, routed to the session
//!   GET  /health           static JSON status

pub mod config;
pub mod error;
pub mod server;
pub mod session;

pub use config::{Args, ServerConfig};
pub use error::AppError;
pub use server::{router, AppState};
