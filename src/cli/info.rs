use anyhow::{Context, Result};

use crate::cli::Paths;
use crate::error::BundlerError;
use crate::synth;

pub fn run(paths: &Paths, server: String) -> Result<()> {
    let workspace = paths.open()?;
    let catalogue = workspace.catalogue().context("failed to open catalogue")?;

    let resolution = catalogue
        .resolve(&server)
        .ok_or_else(|| BundlerError::ServerNotFound { id: server.clone() })?;
    let entry = resolution.entry;
    if resolution.candidates > 1 {
        eprintln!(
            "'{server}' matches {} servers; showing the first.",
            resolution.candidates
        );
    }

    println!("Name:        {}", entry.name);
    println!("Id:          {}", entry.id);
    if let Some(desc) = &entry.description {
        println!("Description: {desc}");
    }
    if !entry.categories.is_empty() {
        println!("Categories:  {}", entry.categories.join(", "));
    }
    if entry.packages.is_empty() {
        println!("Packages:    (none)");
        return Ok(());
    }
    println!("Packages:");
    for (index, package) in entry.packages.iter().enumerate() {
        let version = package
            .version
            .as_ref()
            .map(|v| format!("@{v}"))
            .unwrap_or_default();
        println!(
            "  [{index}] {} {}{version}",
            package.registry_name, package.package_name
        );
        let connections = workspace
            .connections
            .get_by_package_id(&package.composite_id(&entry.id));
        if !connections.is_empty() {
            let names: Vec<_> = connections.iter().map(|c| c.name.as_str()).collect();
            println!("      connections: {}", names.join(", "));
        }
        for var in &package.environment_variables {
            let mut flags = Vec::new();
            if var.is_required {
                flags.push("required");
            }
            if synth::is_secret(var) {
                flags.push("secret");
            }
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            };
            let desc = var
                .description
                .as_ref()
                .map(|d| format!(" - {d}"))
                .unwrap_or_default();
            println!("      {}{flags}{desc}", var.name);
        }
    }
    Ok(())
}
