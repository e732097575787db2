use anyhow::{Context, Result};
use chrono::Utc;

use crate::cli::Paths;
use crate::share::{self, ImportPreview};

pub fn run_share(paths: &Paths, bundle: String) -> Result<()> {
    let workspace = paths.open()?;
    let bundle = workspace.bundles.find(&bundle)?;

    let token = share::encode_bundle(bundle, Utc::now()).context("failed to encode bundle")?;
    let link = share::share_link(workspace.settings(), &token);

    println!("Token: {token}");
    println!("Link:  {link}");
    Ok(())
}

pub fn run_import(paths: &Paths, input: String, dry_run: bool) -> Result<()> {
    let mut workspace = paths.open()?;
    let token = share::extract_token(&input);
    let payload = share::decode_token(token).context("failed to decode share token")?;
    let catalogue = workspace.catalogue().context("failed to open catalogue")?;
    let preview = ImportPreview::build(&payload, &catalogue).context("failed to import bundle")?;

    println!("Bundle:      {}", preview.name);
    if !preview.description.is_empty() {
        println!("Description: {}", preview.description);
    }
    if let Some(at) = preview.encoded_at {
        println!("Shared:      {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("Servers:");
    for server in &preview.resolved {
        let note = if server.candidates > 1 {
            format!(" (first of {} matches)", server.candidates)
        } else {
            String::new()
        };
        println!("  + {} ({}){note}", server.name, server.server_id);
    }
    for reference in &preview.unresolved {
        println!("  ? {reference} (not in catalogue)");
    }

    if dry_run {
        println!("Dry run; nothing imported.");
        return Ok(());
    }

    let id = preview
        .commit(&mut workspace.bundles)
        .context("failed to create bundle")?;
    workspace.flush().context("failed to save bundles")?;

    println!(
        "Imported bundle '{}' ({id}) with {} servers.",
        preview.name,
        preview.resolved.len()
    );
    Ok(())
}
