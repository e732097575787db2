use anyhow::{Context, Result};

use crate::cli::{CredentialSubcommand, Paths, mask};

pub fn run(paths: &Paths, cmd: CredentialSubcommand) -> Result<()> {
    match cmd {
        CredentialSubcommand::Set {
            server,
            key,
            value,
            passphrase,
        } => run_set(paths, server, key, value, passphrase),
        CredentialSubcommand::Get {
            server,
            passphrase,
            show_values,
        } => run_get(paths, server, passphrase, show_values),
        CredentialSubcommand::List => run_list(paths),
        CredentialSubcommand::Remove {
            server,
            key,
            passphrase,
        } => run_remove(paths, server, key, passphrase),
    }
}

fn run_set(
    paths: &Paths,
    server: String,
    key: String,
    value: String,
    passphrase: Option<String>,
) -> Result<()> {
    let mut workspace = paths.open()?;
    workspace
        .credentials
        .set(&server, &key, &value, passphrase.as_deref())
        .context("failed to store credential")?;
    workspace.flush().context("failed to save credentials")?;

    let mode = if passphrase.is_some() { " (encrypted)" } else { "" };
    println!("Set {key} for '{server}'{mode}.");
    Ok(())
}

fn run_get(paths: &Paths, server: String, passphrase: Option<String>, show_values: bool) -> Result<()> {
    let workspace = paths.open()?;
    let values = workspace
        .credentials
        .get(&server, passphrase.as_deref())
        .context("failed to read credentials")?;

    if values.is_empty() {
        println!("No credentials stored for '{server}'.");
        return Ok(());
    }
    for (key, value) in &values {
        let shown = if show_values { value.clone() } else { mask(value) };
        println!("  {key} = {shown}");
    }
    Ok(())
}

fn run_list(paths: &Paths) -> Result<()> {
    let workspace = paths.open()?;
    let servers = workspace.credentials.servers();

    if servers.is_empty() {
        println!("No stored credentials.");
        return Ok(());
    }
    for (server, encrypted) in servers {
        let mode = if encrypted { " (encrypted)" } else { "" };
        println!("  {server}{mode}");
    }
    Ok(())
}

fn run_remove(
    paths: &Paths,
    server: String,
    key: Option<String>,
    passphrase: Option<String>,
) -> Result<()> {
    let mut workspace = paths.open()?;
    let removed = workspace
        .credentials
        .remove(&server, key.as_deref(), passphrase.as_deref())
        .context("failed to remove credential")?;
    workspace.flush().context("failed to save credentials")?;

    match (removed, key) {
        (true, Some(key)) => println!("Removed {key} for '{server}'."),
        (true, None) => println!("Removed all credentials for '{server}'."),
        (false, _) => println!("Nothing to remove for '{server}'."),
    }
    Ok(())
}
