use anyhow::{Context, Result};

use crate::cli::Paths;

pub fn run(paths: &Paths, query: Option<String>, category: Option<String>) -> Result<()> {
    let mut workspace = paths.open()?;
    let query = query.unwrap_or_default();

    let outcome = workspace
        .search_catalogue(&query, category.as_deref())
        .context("failed to search catalogue")?;
    workspace.flush().context("failed to save cache")?;

    if outcome.from_cache {
        eprintln!("Catalogue unavailable or offline; showing cached results.");
    }
    if outcome.hits.is_empty() {
        if query.is_empty() {
            println!("No servers found.");
        } else {
            println!("No servers found for '{query}'.");
        }
        return Ok(());
    }

    for hit in &outcome.hits {
        let desc = hit
            .description
            .as_ref()
            .map(|d| format!(" - {d}"))
            .unwrap_or_default();
        println!("  {} ({}, {} packages){desc}", hit.name, hit.id, hit.packages);
    }
    Ok(())
}
