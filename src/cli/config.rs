use anyhow::{Context, Result};

use crate::cli::{ConfigSubcommand, Paths};
use crate::model::settings::SETTING_KEYS;

pub fn run(paths: &Paths, cmd: ConfigSubcommand) -> Result<()> {
    match cmd {
        ConfigSubcommand::Show => run_show(paths),
        ConfigSubcommand::Set { key, value } => run_set(paths, key, value),
        ConfigSubcommand::Get { key } => run_get(paths, key),
    }
}

fn run_show(paths: &Paths) -> Result<()> {
    let workspace = paths.open()?;
    let settings = workspace.settings();

    println!("Data directory:  {}", workspace.root().display());
    println!("Catalogue:       {}", workspace.catalogue_path().display());
    println!("Cache entries:   {}", workspace.cache.len());
    for key in SETTING_KEYS {
        println!("{:<16} {}", format!("{key}:"), settings.get(key)?);
    }
    Ok(())
}

fn run_set(paths: &Paths, key: String, value: String) -> Result<()> {
    let mut workspace = paths.open()?;

    if let Err(err) = workspace.settings_mut().set(&key, &value) {
        if matches!(err, crate::error::BundlerError::UnknownSetting { .. }) {
            anyhow::bail!("{err}\nValid keys: {}", SETTING_KEYS.join(", "));
        }
        return Err(err.into());
    }
    let stored = workspace.settings().get(&key)?;

    workspace.save_settings().context("failed to save config")?;
    // cached search results belong to the previous catalogue
    if key == "catalogue_path" && !workspace.cache.is_empty() {
        workspace.cache.clear();
        workspace.flush().context("failed to save cache")?;
    }
    println!("Set {key} = {stored}");
    Ok(())
}

fn run_get(paths: &Paths, key: String) -> Result<()> {
    let workspace = paths.open()?;
    println!("{}", workspace.settings().get(&key)?);
    Ok(())
}
