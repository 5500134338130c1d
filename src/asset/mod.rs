//! Bundle assembly.
//!
//! - `concat`: ordered concatenation with a running CRC-32
//! - `version`: `name-<hash>.ext` output names
//! - `bundle`: file resolution + concat + processors for one manifest entry

pub mod bundle;
pub mod concat;
pub mod version;

pub use bundle::{Bundle, build_bundle, resolve_files};
pub use concat::{concat_and_hash, concat_files};
pub use version::versioned_name;
