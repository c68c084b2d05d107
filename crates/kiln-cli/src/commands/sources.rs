//! Sources command - show what discovery found

use super::{load_configuration, ProjectArgs};
use anyhow::{Context, Result};
use kiln_build::{discover_library, enumerate_binaries, BinaryEntry, SourceFile};

pub fn run(project: &ProjectArgs, json: bool) -> Result<()> {
    let config = load_configuration(project)?;
    let library = discover_library(&config.project_root, &config.library_roots, &config.filter)
        .context("Failed to discover library sources")?;
    let binaries = enumerate_binaries(&config.project_root, &config.binary_root, &config.filter)
        .context("Failed to enumerate binaries")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "library": library,
                "binaries": binaries,
            }))?
        );
        return Ok(());
    }

    println!("library ({} sources):", library.len());
    for source in &library {
        println!("  {}", describe(source));
    }

    println!("binaries ({}):", binaries.len());
    for entry in &binaries {
        match entry {
            BinaryEntry::File { name, source } => println!("  {} <- {}", name, describe(source)),
            BinaryEntry::Directory { name, dir, sources } => {
                println!("  {} <- {}/ ({} sources)", name, dir.display(), sources.len());
                for source in sources {
                    println!("      {}", describe(source));
                }
            }
        }
    }
    Ok(())
}

fn describe(source: &SourceFile) -> String {
    match &source.platform {
        Some(platform) => format!("{} [{}, {}]", source.path.display(), source.language, platform),
        None => format!("{} [{}]", source.path.display(), source.language),
    }
}
