//! Configuration file support for fooddrive
//!
//! Reads from fooddrive.toml

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file looked up from the working directory upward
pub const CONFIG_FILE_NAME: &str = "fooddrive.toml";

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Listen address
    #[serde(default)]
    pub server: ServerConfig,

    /// Static files read from disk
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Externally hosted content
    #[serde(default)]
    pub embeds: EmbedsConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Default: "127.0.0.1"
    #[serde(default = "default_host")]
    pub host: String,

    /// Default: 8501
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Paths of the dataset, logo, map fragment and model artifact
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AssetsConfig {
    /// Donation dataset (Latin-1 CSV)
    #[serde(default = "default_dataset")]
    pub dataset: PathBuf,

    /// Logo shown on the dashboard
    #[serde(default = "default_logo")]
    pub logo: PathBuf,

    /// Pre-rendered cluster map
    #[serde(default = "default_cluster_map")]
    pub cluster_map: PathBuf,

    /// Serialized prediction pipeline, re-read on every prediction
    #[serde(default = "default_model")]
    pub model: PathBuf,
}

/// Hosted BI report and data-collection form
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbedsConfig {
    #[serde(default = "default_report_url")]
    pub report_url: String,

    #[serde(default = "default_form_url")]
    pub form_url: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_dataset() -> PathBuf {
    PathBuf::from("data_2024.csv")
}

fn default_logo() -> PathBuf {
    PathBuf::from("logo.jpeg")
}

fn default_cluster_map() -> PathBuf {
    PathBuf::from("cluster_map.html")
}

fn default_model() -> PathBuf {
    PathBuf::from("model.json")
}

fn default_report_url() -> String {
    "https://lookerstudio.google.com/embed/reporting/f776dd4d-6716-486a-bb42-47b56af67bf2/page/z0RYE"
        .to_string()
}

fn default_form_url() -> String {
    "https://forms.gle/Sif2hH3zV5fG2Q7P8".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dataset: default_dataset(),
            logo: default_logo(),
            cluster_map: default_cluster_map(),
            model: default_model(),
        }
    }
}

impl Default for EmbedsConfig {
    fn default() -> Self {
        Self {
            report_url: default_report_url(),
            form_url: default_form_url(),
        }
    }
}

impl Config {
    /// Load config from fooddrive.toml
    /// Returns default config if no file is found
    pub fn load() -> Result<Self> {
        match Self::find_config_path() {
            Some(path) => Self::from_file(&path),
            None => {
                tracing::debug!("no {} found, using defaults", CONFIG_FILE_NAME);
                Ok(Self::default())
            }
        }
    }

    /// Load an explicit config file; relative asset paths resolve against its directory
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut config: Config = toml::from_str(&contents)?;
        if let Some(base) = path.parent() {
            config.assets.resolve_against(base);
        }
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Find fooddrive.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    /// Address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl AssetsConfig {
    fn resolve_against(&mut self, base: &Path) {
        for path in [
            &mut self.dataset,
            &mut self.logo,
            &mut self.cluster_map,
            &mut self.model,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8501");
        assert_eq!(config.assets.dataset, PathBuf::from("data_2024.csv"));
        assert_eq!(config.assets.model, PathBuf::from("model.json"));
        assert!(config.embeds.form_url.starts_with("https://forms.gle/"));
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 9000

[embeds]
form_url = "https://example.org/form"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.embeds.form_url, "https://example.org/form");
        assert_eq!(config.embeds.report_url, default_report_url());
        assert_eq!(config.assets, AssetsConfig::default());
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[assets]\nmodel = \"models/pipeline.json\"\nlogo = \"/srv/logo.png\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.assets.model, dir.path().join("models/pipeline.json"));
        assert_eq!(config.assets.logo, PathBuf::from("/srv/logo.png"));
        assert_eq!(config.assets.dataset, dir.path().join("data_2024.csv"));
    }

    #[test]
    fn test_from_file_rejects_bad_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[server]\nport = \"not a number\"\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file(Path::new("/nonexistent/fooddrive.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
