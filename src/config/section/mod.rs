//! `mend.toml` sections.

mod build;
mod processors;
mod serve;

pub use build::BuildConfig;
pub use processors::ProcessorConfig;
pub use serve::ServeConfig;
