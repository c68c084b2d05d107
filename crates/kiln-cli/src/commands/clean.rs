//! Clean command - remove the build directory

use super::{load_configuration, ProjectArgs};
use anyhow::{Context, Result};
use kiln_build::Builder;

pub fn run(project: &ProjectArgs, quiet: bool) -> Result<()> {
    let config = load_configuration(project)?;
    let removed = Builder::new(&config)
        .clean()
        .context("Failed to clean build artifacts")?;

    if !quiet {
        if removed {
            println!("Removed {}", config.build_dir.display());
        } else {
            println!("Nothing to clean");
        }
    }
    Ok(())
}
