use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::cli::Paths;
use crate::export::{self, install};
use crate::model::ExportFormat;

pub fn run(
    paths: &Paths,
    bundle: String,
    format: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let workspace = paths.open()?;
    let format = match format {
        Some(format) => ExportFormat::parse(&format)?,
        None => workspace.settings().export_format,
    };
    let bundle = workspace.bundles.find(&bundle)?;
    let catalogue = workspace.catalogue().context("failed to open catalogue")?;

    let document = match format {
        ExportFormat::Launcher => export::launcher_document(bundle, &catalogue, &workspace),
        ExportFormat::Bundle => serde_json::to_value(export::bundle_document(
            bundle,
            &catalogue,
            &workspace,
            Utc::now(),
        ))
        .context("failed to serialize bundle document")?,
    };
    let content = serde_json::to_string_pretty(&document).context("failed to serialize export")?;

    match output {
        Some(path) => {
            std::fs::write(&path, content + "\n")
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Exported bundle '{}' ({format}) to {}.",
                bundle.name,
                path.display()
            );
        }
        None => println!("{content}"),
    }
    Ok(())
}

pub fn run_install(paths: &Paths, bundle: String, path: Option<PathBuf>, force: bool) -> Result<()> {
    let workspace = paths.open()?;
    let bundle = workspace.bundles.find(&bundle)?;
    let catalogue = workspace.catalogue().context("failed to open catalogue")?;

    let dir = match path {
        Some(path) => path,
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    let launcher = export::launcher_document(bundle, &catalogue, &workspace);
    let report = install::install_servers(&dir, &launcher, force)
        .with_context(|| format!("failed to install into {}", dir.display()))?;

    for name in &report.added {
        println!("Added '{name}' to {}", report.path.display());
    }
    for name in &report.replaced {
        println!("Replaced '{name}' in {}", report.path.display());
    }
    for name in &report.skipped {
        println!(
            "MCP server '{name}' already configured in {} (use --force to replace)",
            report.path.display()
        );
    }
    Ok(())
}
