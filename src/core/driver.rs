//! Build mode configuration for production/development builds.

/// Build mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMode {
    /// Whether the output is served from memory by the live server.
    /// Processors registered as production-only are skipped.
    pub live: bool,
}

impl BuildMode {
    /// Production mode: every resolved processor runs, output goes to disk.
    pub const PRODUCTION: Self = Self { live: false };

    /// Development mode: in-memory output for the live server.
    pub const DEVELOPMENT: Self = Self { live: true };

    /// Check if this is development mode.
    #[inline]
    pub const fn is_dev(&self) -> bool {
        self.live
    }
}
