use std::collections::BTreeMap;

use anyhow::{Context, Result};

use crate::cli::bundle::resolve_server;
use crate::cli::{ConnectionSubcommand, Paths, mask};
use crate::model::{Connection, ConnectionUpdate, Package};
use crate::store::{CatalogueStore, Workspace};

pub fn run(paths: &Paths, cmd: ConnectionSubcommand) -> Result<()> {
    match cmd {
        ConnectionSubcommand::Create {
            name,
            server,
            package,
            credentials,
        } => run_create(paths, name, server, package, credentials),
        ConnectionSubcommand::List { server } => run_list(paths, server),
        ConnectionSubcommand::Info {
            connection,
            show_values,
        } => run_info(paths, connection, show_values),
        ConnectionSubcommand::Update {
            connection,
            name,
            credentials,
        } => run_update(paths, connection, name, credentials),
        ConnectionSubcommand::Set {
            connection,
            key,
            value,
        } => run_set(paths, connection, key, value),
        ConnectionSubcommand::Unset { connection, key } => run_unset(paths, connection, key),
        ConnectionSubcommand::Check { connection } => run_check(paths, connection),
        ConnectionSubcommand::Remove { connection } => run_remove(paths, connection),
    }
}

fn find(workspace: &Workspace, connection: &str) -> Result<Connection> {
    Ok(workspace
        .connections
        .find(connection)
        .context("failed to look up connection")?
        .clone())
}

/// The package a connection's composite package id points at.
fn connection_package<'a>(catalogue: &'a CatalogueStore, connection: &Connection) -> Option<&'a Package> {
    catalogue
        .get(&connection.server_id)
        .and_then(|entry| entry.package_by_composite_id(&connection.package_id))
        .map(|(_, package)| package)
}

fn run_create(
    paths: &Paths,
    name: String,
    server: String,
    package: usize,
    credentials: Vec<(String, String)>,
) -> Result<()> {
    let mut workspace = paths.open()?;
    let catalogue = workspace.catalogue().context("failed to open catalogue")?;
    let server_id = resolve_server(&catalogue, &server, package)?;
    let package_id = catalogue
        .get(&server_id)
        .and_then(|entry| entry.package(package))
        .map(|p| p.composite_id(&server_id))
        .context("package disappeared from catalogue")?;

    let credentials: BTreeMap<String, String> = credentials.into_iter().collect();
    let id = workspace
        .connections
        .create(name.clone(), server_id, package_id, credentials)
        .id
        .clone();
    workspace.flush().context("failed to save connections")?;

    println!("Created connection '{name}' ({id}).");
    Ok(())
}

fn run_list(paths: &Paths, server: Option<String>) -> Result<()> {
    let workspace = paths.open()?;
    let connections: Vec<&Connection> = match &server {
        Some(server) => workspace.connections.get_by_server_id(server),
        None => workspace.connections.list().iter().collect(),
    };

    if connections.is_empty() {
        println!("No connections.");
        return Ok(());
    }

    for c in connections {
        println!(
            "  {} ({}) {} [{} credentials]",
            c.name,
            c.package_id,
            c.id,
            c.credentials.len()
        );
    }
    Ok(())
}

fn run_info(paths: &Paths, connection: String, show_values: bool) -> Result<()> {
    let workspace = paths.open()?;
    let connection = find(&workspace, &connection)?;

    println!("Name:        {}", connection.name);
    println!("Id:          {}", connection.id);
    println!("Server:      {}", connection.server_id);
    println!("Package:     {}", connection.package_id);
    println!("Created:     {}", connection.created.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Updated:     {}", connection.updated.format("%Y-%m-%d %H:%M:%S UTC"));

    let used_by = workspace
        .bundles
        .list()
        .iter()
        .filter(|b| b.references_connection(&connection.id))
        .map(|b| b.name.as_str())
        .collect::<Vec<_>>();
    if !used_by.is_empty() {
        println!("Used by:     {}", used_by.join(", "));
    }

    if connection.credentials.is_empty() {
        println!("Credentials: (none)");
        return Ok(());
    }
    println!("Credentials:");
    for (key, value) in &connection.credentials {
        let shown = if show_values { value.clone() } else { mask(value) };
        println!("  {key} = {shown}");
    }
    Ok(())
}

fn run_update(
    paths: &Paths,
    connection: String,
    name: Option<String>,
    credentials: Vec<(String, String)>,
) -> Result<()> {
    let mut workspace = paths.open()?;
    let id = find(&workspace, &connection)?.id;

    let update = ConnectionUpdate {
        name,
        credentials: if credentials.is_empty() {
            None
        } else {
            Some(credentials.into_iter().collect())
        },
        ..ConnectionUpdate::default()
    };
    let name = workspace
        .connections
        .update(&id, update)
        .context("failed to update connection")?
        .name
        .clone();
    workspace.flush().context("failed to save connections")?;

    println!("Updated connection '{name}'.");
    Ok(())
}

fn run_set(paths: &Paths, connection: String, key: String, value: String) -> Result<()> {
    let mut workspace = paths.open()?;
    let found = find(&workspace, &connection)?;

    workspace.connections.set_credential(&found.id, &key, &value)?;
    workspace.flush().context("failed to save connections")?;

    println!("Set {key} on connection '{}'.", found.name);
    Ok(())
}

fn run_unset(paths: &Paths, connection: String, key: String) -> Result<()> {
    let mut workspace = paths.open()?;
    let found = find(&workspace, &connection)?;

    let removed = workspace.connections.remove_credential(&found.id, &key)?;
    workspace.flush().context("failed to save connections")?;

    match removed {
        Some(_) => println!("Removed {key} from connection '{}'.", found.name),
        None => println!("Connection '{}' has no {key}.", found.name),
    }
    Ok(())
}

fn run_check(paths: &Paths, connection: String) -> Result<()> {
    let workspace = paths.open()?;
    let found = find(&workspace, &connection)?;
    let catalogue = workspace.catalogue().ok();
    let package = catalogue.as_ref().and_then(|c| connection_package(c, &found));

    let Some(package) = package else {
        let ok = workspace.connections.has_required_credentials(&found.id, None)?;
        println!(
            "Package '{}' is not in the catalogue; {}.",
            found.package_id,
            if ok {
                "connection has credentials"
            } else {
                "connection has no credentials"
            }
        );
        return Ok(());
    };

    let missing = workspace.connections.missing_credentials(&found.id, package)?;
    if missing.is_empty() {
        println!("Connection '{}' has every required credential.", found.name);
    } else {
        println!("Connection '{}' is missing:", found.name);
        for name in &missing {
            println!("  - {name}");
        }
    }
    Ok(())
}

fn run_remove(paths: &Paths, connection: String) -> Result<()> {
    let mut workspace = paths.open()?;
    let removed = workspace
        .delete_connection(&connection)
        .context("failed to remove connection")?;
    workspace.flush().context("failed to save connections")?;

    println!("Removed connection '{}'.", removed.name);
    Ok(())
}
