//! Browser live reload.
//!
//! ```text
//! LiveServer ──on_change──► ReloadHub ──ws {"type":"reload"}──► reload.js ──► location.reload()
//! ```
//!
//! - `message` - JSON messages sent to browser clients
//! - `server` - WebSocket acceptor and client registry

pub mod message;
pub mod server;

pub use message::ReloadMessage;
pub use server::ReloadHub;
