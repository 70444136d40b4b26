//! Config commands

use crate::config::Config;
use crate::ConfigCommands;
use anyhow::Result;

pub fn handle(action: ConfigCommands, profile: Option<&str>) -> Result<()> {
    match action {
        ConfigCommands::Init => {
            let config = Config {
                data_file: Some(Config::default().data_file()),
                autosave_interval_secs: Some(isms_common::autosave::DEFAULT_AUTOSAVE_INTERVAL.as_secs()),
                default_format: Some("table".into()),
            };
            let path = config.save(profile)?;
            println!("Configuration initialized at {}", path.display());
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(profile)?;
            config.set(&key, &value)?;
            config.save(profile)?;
            println!("Set {} successfully", key);
        }
        ConfigCommands::Get { key } => {
            let config = Config::load(profile)?;
            let value = config.get(&key)?;
            println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
        }
        ConfigCommands::List => {
            let config = Config::load(profile)?;
            for key in Config::KEYS {
                println!("{}: {}", key, config.get(key)?.unwrap_or_else(|| "(not set)".into()));
            }
            println!("effective data file: {}", config.data_file().display());
        }
    }
    Ok(())
}
