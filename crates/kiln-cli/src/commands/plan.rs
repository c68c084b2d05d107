//! Plan command - print every compile and link command without running them

use super::{load_configuration, ProjectArgs};
use anyhow::{Context, Result};
use kiln_build::{Builder, Phase};

pub fn run(project: &ProjectArgs, json: bool) -> Result<()> {
    let config = load_configuration(project)?;
    let plan = Builder::new(&config)
        .plan()
        .context("Failed to plan build")?;
    let commands = plan.commands(&config.toolchain, &config.include_dirs);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "project": config.project_name,
                "profile": config.profile,
                "toolchain": config.toolchain,
                "plan": plan,
                "commands": commands,
            }))?
        );
        return Ok(());
    }

    for collision in &plan.collisions {
        eprintln!(
            "note: {} sources flatten to '{}'; their objects carry a path digest",
            collision.sources.len(),
            collision.flattened
        );
    }

    for command in &commands {
        match command.phase {
            Phase::Compile => println!("# compile {}", command.path.display()),
            Phase::Link => println!("# link {} -> {}", command.target, command.path.display()),
        }
        println!("{}", command.invocation);
    }
    Ok(())
}
