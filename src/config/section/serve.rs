//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 5280                 # HTTP port number
//! root = "public"             # Static files served when no bundle matches
//! watch = true                # Rebuild bundles on file changes
//! debounce_ms = 100           # Quiet period before a rebuild starts
//! reload = true               # Push reloads to connected browsers
//! reload_port = 35730         # WebSocket port for live reload
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Development server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    pub port: u16,

    /// Static fallback directory. Without it, unmatched paths get a 404.
    pub root: Option<PathBuf>,

    pub watch: bool,

    pub debounce_ms: u64,

    /// Enable the live reload WebSocket server.
    pub reload: bool,

    pub reload_port: u16,
}

impl ServeConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5280,
            root: None,
            watch: true,
            debounce_ms: 100,
            reload: true,
            reload_port: 35730,
        }
    }
}
