//! Show or save the effective configuration.

use std::path::Path;

use leapmove_common::config::AppConfig;

pub fn run(config: &AppConfig, path: &Path, save: bool) -> anyhow::Result<()> {
    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);

    if save {
        config.save_to(path)?;
        println!();
        println!("Configuration saved to: {}", path.display());
    }

    Ok(())
}
