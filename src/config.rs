//! Runtime configuration assembled from defaults and environment variables.
//! Everything lives beneath one data directory in the user's home so the
//! database and the log file travel together.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;

use crate::models::Location;
use crate::store::WritePolicy;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".music-facts";
/// SQLite file holding every collection slot.
const DB_FILE_NAME: &str = "collections.sqlite";
const LOG_FILE_NAME: &str = "music-facts.log";

pub const DATA_DIR_VAR: &str = "MUSIC_FACTS_DATA_DIR";
pub const WRITE_POLICY_VAR: &str = "MUSIC_FACTS_WRITE_POLICY";
pub const LOCATION_VAR: &str = "MUSIC_FACTS_LOCATION";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub write_policy: WritePolicy,
    /// Fixed position handed out by the location provider, if any.
    pub location: Option<Location>,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup. Tests pass a
    /// closure over a map instead of mutating the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match lookup(DATA_DIR_VAR) {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
            _ => default_data_dir()?,
        };

        let write_policy = match lookup(WRITE_POLICY_VAR) {
            Some(raw) => parse_write_policy(&raw)
                .with_context(|| format!("invalid {WRITE_POLICY_VAR}"))?,
            None => WritePolicy::default(),
        };

        let location = match lookup(LOCATION_VAR) {
            Some(raw) if !raw.trim().is_empty() => {
                Some(parse_location(&raw).with_context(|| format!("invalid {LOCATION_VAR}"))?)
            }
            _ => None,
        };

        Ok(Self {
            data_dir,
            write_policy,
            location,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }
}

/// Resolve the default data directory inside the user's home.
fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

fn parse_write_policy(raw: &str) -> Result<WritePolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "optimistic" => Ok(WritePolicy::Optimistic),
        "durable-first" | "durable_first" => Ok(WritePolicy::DurableFirst),
        other => Err(anyhow!(
            "unknown write policy {other:?} (expected optimistic or durable-first)"
        )),
    }
}

/// Parse `"lat,lon"`.
fn parse_location(raw: &str) -> Result<Location> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| anyhow!("expected \"latitude,longitude\", got {raw:?}"))?;
    let latitude = lat.trim().parse::<f64>().context("latitude is not a number")?;
    let longitude = lon.trim().parse::<f64>().context("longitude is not a number")?;
    Ok(Location::new(latitude, longitude))
}
