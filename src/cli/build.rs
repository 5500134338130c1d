//! `mend build`: every bundle to disk plus the version map.

use std::io;

use anyhow::{Context, Result};
use mender::batch;
use mender::config::MendConfig;
use mender::{debug, log};

pub fn build(config: &MendConfig) -> Result<()> {
    let manifest = config.manifest_path();
    let versions_path = config.versions_path();
    let output = config.output_dir();
    let registry = config.registry();
    debug!("build"; "processors: {}", registry.names().join(", "));

    let versions = batch::build(
        &manifest,
        &versions_path,
        &output,
        &registry,
        &mut io::stderr(),
    )
    .with_context(|| format!("build of `{}` failed", manifest.display()))?;

    for (name, versioned) in versions.iter() {
        log!("build"; "{} -> {}", name, versioned);
    }
    log!(
        "build";
        "{} bundle(s) in {}, versions in {}",
        versions.len(),
        output.display(),
        versions_path.display()
    );
    Ok(())
}
