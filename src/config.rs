use chrono::Weekday;
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::provider::{Error, Result, Tz};

const CONFIG_PATH_ENV_VAR: &str = "CALGRID_CONFIG_FILE";

pub(crate) fn find_configfile_locations() -> Vec<PathBuf> {
    let mut locations = Vec::new();

    if let Ok(path) = env::var(CONFIG_PATH_ENV_VAR) {
        locations.push(PathBuf::from(path));
    }

    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("calgrid").join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        locations.push(home.join(".calgrid.toml"));
    }

    locations
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub hide_weekends: bool,
    #[serde_as(as = "DisplayFromStr")]
    pub week_start: Weekday,
    pub timezone: Tz,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            hide_weekends: false,
            week_start: Weekday::Mon,
            timezone: Tz::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|err| {
            Error::from(err).with_msg(&format!("could not read '{}'", path.display()))
        })?;

        content.parse()
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Loads `path` if given, otherwise the first config file found in the
/// usual locations, otherwise the defaults.
pub fn load_suitable_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Config::load(path);
    }

    match find_configfile_locations().into_iter().find(|p| p.is_file()) {
        Some(found) => {
            log::info!("using config file '{}'", found.display());
            Config::load(&found)
        }
        None => {
            log::debug!("no config file found, using defaults");
            Ok(Config::default())
        }
    }
}
