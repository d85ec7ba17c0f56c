//! User configuration.
//!
//! Read from `config.toml` in the platform config directory, or from an
//! explicit `--config` path. Problems with the file are reported as warnings
//! and the defaults are used instead.

use directories::ProjectDirs;
use gridcalc_core::{CsvValues, DEFAULT_COLS, DEFAULT_ROWS};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MAX_CONFIG_BYTES: u64 = 64 * 1024;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub rows: usize,
    pub cols: usize,
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Which values CSV output carries unless `--raw` is given.
    pub export: CsvValues,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            log_level: "warn".to_string(),
            export: CsvValues::Display,
        }
    }
}

/// Load the configuration from `explicit` or the user config file.
///
/// A missing user config is silent; a missing explicit path is a warning.
pub fn load_config(explicit: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let path = explicit.map(Path::to_path_buf).or_else(user_config_path);
    let Some(path) = path else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        if explicit.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    match read_config(&path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => return (config, warnings),
            Err(err) => warnings.push(format!("Failed to parse {}: {}", path.display(), err)),
        },
        Err(err) => warnings.push(format!("Failed to read {}: {}", path.display(), err)),
    }
    (Config::default(), warnings)
}

pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(content)
}

fn read_config(path: &Path) -> std::io::Result<String> {
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_CONFIG_BYTES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("file too large ({} bytes, max {})", meta.len(), MAX_CONFIG_BYTES),
        ));
    }
    std::fs::read_to_string(path)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "gridcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}
