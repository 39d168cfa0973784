//! Clean the output directory

use std::fs;

use crate::error::{BuildError, BuildResult};
use crate::Site;

/// Delete the output directory if it exists
pub fn run(site: &Site) -> BuildResult<()> {
    if site.output_dir.exists() {
        fs::remove_dir_all(&site.output_dir).map_err(|e| BuildError::io(&site.output_dir, e))?;
        tracing::info!("Deleted: {:?}", site.output_dir);
    }

    Ok(())
}
