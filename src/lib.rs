//! Mender - content-addressed asset bundling.
//!
//! A manifest names bundles (file lists or glob patterns plus a processor
//! chain). Each bundle is concatenated, hashed into a versioned file name and
//! run through its processors. Results are either written to disk with a
//! version map ([`batch::build`]) or served from memory by a
//! [`live::LiveServer`] that rebuilds whenever a watched file changes.
//!
//! ```text
//! manifest ─► asset::bundle ─┬─► batch   (disk + mend-versions.json)
//!              │             └─► live    (ArcSwap<Snapshot> + HTTP)
//!              ├─ asset::concat   (concat + crc32)
//!              └─ processor       (registry + chain)
//! ```

pub mod logger;

pub mod asset;
pub mod batch;
pub mod config;
pub mod core;
pub mod embed;
pub mod error;
pub mod live;
pub mod manifest;
pub mod processor;
pub mod reload;
pub mod utils;
pub mod versions;

pub use error::{MendError, Result};
pub use manifest::{Entry, Manifest};
pub use processor::{Processor, ProcessorRegistry};
pub use versions::{VersionMap, Versioner};
