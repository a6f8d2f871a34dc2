//! `parley config`

use anyhow::Result;
use parley_config::AppConfig;

/// Print the configuration after file, env and flag overrides
pub fn execute(config: &AppConfig) -> Result<()> {
    print!("{}", config.display_as_toml()?);
    Ok(())
}
