// ⚙️ Configuration
//
// Layering: defaults → optional TOML file → environment.
//
// Environment:
//   HBNB_CONFIG     path of the TOML file (default: hbnb.toml)
//   HBNB_API_HOST   bind host
//   HBNB_API_PORT   bind port
//   HBNB_FILE_PATH  JSON store path
//   FS_TEST=yes     use the test store (test_file.json) unless a path is set

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_FILE: &str = "file.json";
pub const TEST_FILE: &str = "test_file.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub file_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            file_path: PathBuf::from(DEFAULT_FILE),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("hbnb.toml")
}

impl Config {
    /// Load from the process environment (and the TOML file it points at).
    pub fn load() -> Result<Self> {
        let path = std::env::var_os("HBNB_CONFIG").map(PathBuf::from);
        Self::load_with(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Same as `load`, with an explicit file and variable lookup.
    pub fn load_with<F>(path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match load_file(path)? {
            Some(config) => config,
            None => Config::default(),
        };
        config.apply_env(env)?;
        Ok(config)
    }

    fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if env("FS_TEST").as_deref() == Some("yes") {
            self.file_path = PathBuf::from(TEST_FILE);
        }
        if let Some(path) = env("HBNB_FILE_PATH") {
            self.file_path = PathBuf::from(path);
        }
        if let Some(host) = env("HBNB_API_HOST") {
            self.host = host;
        }
        if let Some(port) = env("HBNB_API_PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("HBNB_API_PORT is not a port: {}", port))?;
        }
        Ok(())
    }

    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read a TOML config file. A missing file is not an error.
pub fn load_file(path: Option<&Path>) -> Result<Option<Config>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(Some(config))
}
