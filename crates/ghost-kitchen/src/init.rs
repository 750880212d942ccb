//! `ghost-kitchen init`: write a starter setup directory.

use std::path::Path;

use tracing::info;

use gk_setup::loader::SIMULATION_FILE;
use gk_setup::{BrandTemplate, SiteTemplate, template_source, write_setup_dir};

use crate::{GhostKitchenError, GhostKitchenResult};

/// Write a template setup with the chosen sites and brands into `dir`.
/// Refuses to overwrite an existing setup.
pub fn init_setup(dir: &Path, sites: &[SiteTemplate], brands: &[BrandTemplate]) -> GhostKitchenResult<()> {
    if dir.join(SIMULATION_FILE).exists() {
        return Err(GhostKitchenError::AlreadyInitialized(dir.to_path_buf()));
    }
    let source = template_source(sites, brands);
    // Catch an unusable selection (e.g. no brands) before touching the disk.
    source.clone().build()?;
    write_setup_dir(&source, dir)?;
    info!(
        path = %dir.display(),
        sites = sites.len(),
        brands = brands.len(),
        "setup initialised"
    );
    Ok(())
}
