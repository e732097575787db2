use std::io::Write;

use anyhow::{Context, Result};

use crate::cli::{BundleSubcommand, Paths};
use crate::error::BundlerError;
use crate::model::{Bundle, BundleUpdate};
use crate::store::{CatalogueStore, Workspace};

pub fn run(paths: &Paths, cmd: BundleSubcommand) -> Result<()> {
    match cmd {
        BundleSubcommand::Create {
            name,
            description,
            tag,
            server,
        } => run_create(paths, name, description, tag, server),
        BundleSubcommand::List { tag } => run_list(paths, tag),
        BundleSubcommand::Info { bundle } => run_info(paths, bundle),
        BundleSubcommand::Update {
            bundle,
            name,
            description,
            tag,
        } => run_update(paths, bundle, name, description, tag),
        BundleSubcommand::Remove { bundle, force } => run_remove(paths, bundle, force),
        BundleSubcommand::AddServer {
            bundle,
            server,
            package,
        } => run_add_server(paths, bundle, server, package),
        BundleSubcommand::RemoveServer { bundle, server } => run_remove_server(paths, bundle, server),
        BundleSubcommand::Attach {
            bundle,
            server,
            connection,
        } => run_attach(paths, bundle, server, connection),
        BundleSubcommand::Detach { bundle, server } => run_detach(paths, bundle, server),
        BundleSubcommand::SetPackage {
            bundle,
            server,
            package,
        } => run_set_package(paths, bundle, server, package),
    }
}

/// Resolves a server reference against the catalogue and checks the package
/// index exists. Returns the full server id.
pub fn resolve_server(catalogue: &CatalogueStore, reference: &str, package: usize) -> Result<String> {
    let resolution = catalogue.resolve(reference).ok_or_else(|| BundlerError::ServerNotFound {
        id: reference.to_string(),
    })?;
    if resolution.candidates > 1 {
        anyhow::bail!(
            "server '{reference}' matches {} catalogue entries; use a longer id",
            resolution.candidates
        );
    }
    let entry = resolution.entry;
    if entry.package(package).is_none() {
        return Err(BundlerError::PackageNotFound {
            server: entry.id.clone(),
            index: package,
        }
        .into());
    }
    Ok(entry.id.clone())
}

/// Matches a server reference against the servers already in a bundle,
/// accepting a unique id prefix.
fn bundled_server_id(bundle: &Bundle, reference: &str) -> String {
    if bundle.entry(reference).is_some() {
        return reference.to_string();
    }
    let mut matching = bundle
        .servers
        .iter()
        .filter(|e| e.server_id.starts_with(reference));
    match (matching.next(), matching.next()) {
        (Some(entry), None) => entry.server_id.clone(),
        _ => reference.to_string(),
    }
}

/// Composite id of the package a bundled server currently uses, when the
/// catalogue can be read and still lists it.
fn selected_package_id(workspace: &Workspace, bundle_id: &str, server_id: &str) -> Option<String> {
    let index = workspace.bundles.get(bundle_id)?.entry(server_id)?.package_index;
    let catalogue = workspace.catalogue().ok()?;
    let package = catalogue.get(server_id)?.package(index)?;
    Some(package.composite_id(server_id))
}

fn find_id(workspace: &Workspace, bundle: &str) -> Result<String> {
    Ok(workspace
        .bundles
        .find(bundle)
        .context("failed to look up bundle")?
        .id
        .clone())
}

fn run_create(
    paths: &Paths,
    name: String,
    description: Option<String>,
    tags: Vec<String>,
    servers: Vec<String>,
) -> Result<()> {
    let mut workspace = paths.open()?;

    let server_ids = if servers.is_empty() {
        Vec::new()
    } else {
        let catalogue = workspace.catalogue().context("failed to open catalogue")?;
        servers
            .iter()
            .map(|s| resolve_server(&catalogue, s, 0))
            .collect::<Result<Vec<_>>>()?
    };

    let id = workspace
        .bundles
        .create(name.clone(), description.unwrap_or_default())
        .context("failed to create bundle")?
        .id
        .clone();
    if !tags.is_empty() {
        workspace.bundles.update(
            &id,
            BundleUpdate {
                tags: Some(tags),
                ..BundleUpdate::default()
            },
        )?;
    }
    for server_id in &server_ids {
        workspace.bundles.add_server(&id, server_id, 0)?;
    }
    workspace.flush().context("failed to save bundles")?;

    println!("Created bundle '{name}' ({id}).");
    Ok(())
}

fn run_list(paths: &Paths, tag: Option<String>) -> Result<()> {
    let workspace = paths.open()?;
    let bundles = workspace.bundles.list_tagged(tag.as_deref());

    if bundles.is_empty() {
        println!("No bundles.");
        return Ok(());
    }

    for b in bundles {
        let tags = if b.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", b.tags.join(", "))
        };
        let desc = if b.description.is_empty() {
            String::new()
        } else {
            format!(" - {}", b.description)
        };
        println!(
            "  {} ({} servers) {}{}{}",
            b.name,
            b.servers.len(),
            b.id,
            desc,
            tags
        );
    }
    Ok(())
}

fn run_info(paths: &Paths, bundle: String) -> Result<()> {
    let workspace = paths.open()?;
    let bundle = workspace.bundles.find(&bundle)?;
    let catalogue = workspace.catalogue().ok();

    println!("Name:        {}", bundle.name);
    println!("Id:          {}", bundle.id);
    if !bundle.description.is_empty() {
        println!("Description: {}", bundle.description);
    }
    if !bundle.tags.is_empty() {
        println!("Tags:        {}", bundle.tags.join(", "));
    }
    println!("Created:     {}", bundle.created.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Updated:     {}", bundle.updated.format("%Y-%m-%d %H:%M:%S UTC"));

    if bundle.servers.is_empty() {
        println!("Servers:     (none)");
        return Ok(());
    }
    println!("Servers:");
    for entry in &bundle.servers {
        let server = catalogue.as_ref().and_then(|c| c.get(&entry.server_id));
        let label = match server {
            Some(server) => match server.package(entry.package_index) {
                Some(package) => format!(
                    "{} [{} {}]",
                    server.name, package.registry_name, package.package_name
                ),
                None => format!("{} [missing package #{}]", server.name, entry.package_index),
            },
            None => "(not in catalogue)".to_string(),
        };
        let attached = workspace
            .bundles
            .get_server_connection(&bundle.id, &entry.server_id, &workspace.connections)?;
        let connection = match (attached, entry.connection_id.as_deref()) {
            (Some(c), _) => format!(" via '{}'", c.name),
            (None, Some(id)) => format!(" via missing connection {id}"),
            (None, None) => String::new(),
        };
        println!("  - {} {label}{connection}", entry.server_id);
    }
    Ok(())
}

fn run_update(
    paths: &Paths,
    bundle: String,
    name: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
) -> Result<()> {
    let mut workspace = paths.open()?;
    let id = find_id(&workspace, &bundle)?;

    let update = BundleUpdate {
        name,
        description,
        tags: if tags.is_empty() { None } else { Some(tags) },
    };
    let updated = workspace
        .bundles
        .update(&id, update)
        .context("failed to update bundle")?
        .name
        .clone();
    workspace.flush().context("failed to save bundles")?;

    println!("Updated bundle '{updated}'.");
    Ok(())
}

fn run_remove(paths: &Paths, bundle: String, force: bool) -> Result<()> {
    let mut workspace = paths.open()?;
    let id = find_id(&workspace, &bundle)?;

    if !force {
        let servers = workspace.bundles.get(&id).map_or(0, |b| b.servers.len());
        eprint!("Remove bundle '{bundle}' ({servers} servers)? [y/N] ");
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = workspace.bundles.delete(&id).context("failed to remove bundle")?;
    workspace.flush().context("failed to save bundles")?;

    println!("Removed bundle '{}'.", removed.name);
    Ok(())
}

fn run_add_server(paths: &Paths, bundle: String, server: String, package: usize) -> Result<()> {
    let mut workspace = paths.open()?;
    let id = find_id(&workspace, &bundle)?;
    let catalogue = workspace.catalogue().context("failed to open catalogue")?;
    let server_id = resolve_server(&catalogue, &server, package)?;

    let added = workspace.bundles.add_server(&id, &server_id, package)?;
    workspace.flush().context("failed to save bundles")?;

    if added {
        println!("Added '{server_id}' to bundle '{bundle}'.");
    } else {
        println!("'{server_id}' is already in bundle '{bundle}'.");
    }
    Ok(())
}

fn run_remove_server(paths: &Paths, bundle: String, server: String) -> Result<()> {
    let mut workspace = paths.open()?;
    let id = find_id(&workspace, &bundle)?;
    let server_id = bundled_server_id(workspace.bundles.find(&id)?, &server);

    let removed = workspace.bundles.remove_server(&id, &server_id)?;
    workspace.flush().context("failed to save bundles")?;

    if removed {
        println!("Removed '{server_id}' from bundle '{bundle}'.");
    } else {
        println!("'{server_id}' is not in bundle '{bundle}'.");
    }
    Ok(())
}

fn run_attach(paths: &Paths, bundle: String, server: String, connection: String) -> Result<()> {
    let mut workspace = paths.open()?;
    let id = find_id(&workspace, &bundle)?;
    let server_id = bundled_server_id(workspace.bundles.find(&id)?, &server);
    let connection = workspace
        .connections
        .find(&connection)
        .context("failed to look up connection")?
        .clone();

    if connection.server_id != server_id {
        tracing::warn!(
            connection = %connection.id,
            connection_server = %connection.server_id,
            server = %server_id,
            "attaching a connection created for a different server"
        );
    } else if let Some(package_id) = selected_package_id(&workspace, &id, &server_id) {
        let matching = workspace
            .connections
            .get_by_server_and_package(&server_id, &package_id);
        if !matching.iter().any(|c| c.id == connection.id) {
            tracing::warn!(
                connection = %connection.id,
                connection_package = %connection.package_id,
                package = %package_id,
                "attaching a connection created for a different package"
            );
        }
    }

    workspace
        .bundles
        .attach_connection(&id, &server_id, &connection.id)
        .context("failed to attach connection")?;
    workspace.flush().context("failed to save bundles")?;

    println!(
        "Attached connection '{}' to '{server_id}' in bundle '{bundle}'.",
        connection.name
    );
    Ok(())
}

fn run_detach(paths: &Paths, bundle: String, server: String) -> Result<()> {
    let mut workspace = paths.open()?;
    let id = find_id(&workspace, &bundle)?;
    let server_id = bundled_server_id(workspace.bundles.find(&id)?, &server);

    let detached = workspace.bundles.detach_connection(&id, &server_id)?;
    workspace.flush().context("failed to save bundles")?;

    if detached {
        println!("Detached connection from '{server_id}' in bundle '{bundle}'.");
    } else {
        println!("No connection attached to '{server_id}' in bundle '{bundle}'.");
    }
    Ok(())
}

fn run_set_package(paths: &Paths, bundle: String, server: String, package: usize) -> Result<()> {
    let mut workspace = paths.open()?;
    let id = find_id(&workspace, &bundle)?;
    let server_id = bundled_server_id(workspace.bundles.find(&id)?, &server);

    let catalogue = workspace.catalogue().context("failed to open catalogue")?;
    let entry = catalogue.get(&server_id).ok_or_else(|| BundlerError::ServerNotFound {
        id: server_id.clone(),
    })?;
    let package_spec = entry.package(package).ok_or_else(|| BundlerError::PackageNotFound {
        server: server_id.clone(),
        index: package,
    })?;
    let label = format!("{} {}", package_spec.registry_name, package_spec.package_name);

    workspace
        .bundles
        .set_package(&id, &server_id, package)
        .context("failed to select package")?;
    workspace.flush().context("failed to save bundles")?;

    println!("'{server_id}' in bundle '{bundle}' now uses {label}.");
    Ok(())
}
