//! Live reload message protocol.
//!
//! Server → client only; clients never send anything the server acts on.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Sent once after the handshake
    Connected { version: String },

    /// Bundles changed; reload the page
    Reload { generation: u64 },
}

impl ReloadMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn reload(generation: u64) -> Self {
        Self::Reload { generation }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
