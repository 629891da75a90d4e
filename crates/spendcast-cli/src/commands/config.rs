//! Configuration display command

use std::path::Path;

use anyhow::{Context, Result};
use spendcast_core::config::default_config_path;
use spendcast_core::ForecastConfig;

pub fn cmd_config(config_path: Option<&Path>, show_path: bool) -> Result<()> {
    if show_path {
        match config_path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => {
                let marker = if path.exists() { "" } else { " (not present, using defaults)" };
                println!("{}{}", path.display(), marker);
            }
            None => println!("No config directory available on this platform"),
        }
        return Ok(());
    }

    let config = ForecastConfig::load(config_path).context("Failed to load configuration")?;
    let rendered =
        toml::to_string_pretty(&config).context("Failed to serialize configuration to TOML")?;
    print!("{}", rendered);
    Ok(())
}
