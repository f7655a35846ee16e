//! Editor session and live preview server for lander.
//!
//! The session owns the undo history, mirrors every snapshot into durable
//! storage and pushes it to connected rendering contexts. The server exposes
//! the session over HTTP and WebSocket.

pub mod server;
pub mod session;
pub mod watcher;

pub use server::{EditorServer, EditorServerConfig, ServerError};
pub use session::{EditorSession, SessionError, SessionState};
pub use watcher::ConfigWatcher;
