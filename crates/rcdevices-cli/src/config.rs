//! Configuration loading

use anyhow::{bail, Result};
use clap::ValueEnum;
use rcdevices_driver::{Provider, ScriptedProvider};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where device data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Vendor driver library (requires the `native` feature)
    Native,
    /// Device script loaded from a TOML fixture
    Scripted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Console layout of the vendor example program
    #[default]
    Text,
    /// JSON envelopes with a `success` flag
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_backend")]
    pub backend: Backend,
    /// Fixture for the scripted backend
    #[serde(default)]
    pub fixture: Option<PathBuf>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            fixture: None,
        }
    }
}

fn default_backend() -> Backend {
    if cfg!(feature = "native") {
        Backend::Native
    } else {
        Backend::Scripted
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

impl Config {
    /// Open the configured device provider
    pub fn open_provider(&self) -> Result<Box<dyn Provider>> {
        match self.driver.backend {
            Backend::Native => open_native(),
            Backend::Scripted => {
                let Some(path) = &self.driver.fixture else {
                    bail!("scripted backend needs a fixture: set driver.fixture or pass --fixture");
                };
                Ok(Box::new(ScriptedProvider::load(path)?))
            }
        }
    }
}

#[cfg(feature = "native")]
fn open_native() -> Result<Box<dyn Provider>> {
    Ok(Box::new(rcdevices_driver::NativeDriver::new()))
}

#[cfg(not(feature = "native"))]
fn open_native() -> Result<Box<dyn Provider>> {
    bail!("native backend unavailable: rebuild with `--features native`")
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        // A relative fixture is relative to the file that names it
        if let (Some(fixture), Some(dir)) = (&config.driver.fixture, path.parent()) {
            if fixture.is_relative() {
                config.driver.fixture = Some(dir.join(fixture));
            }
        }
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("rcdevices.toml")).unwrap();
        assert_eq!(config.driver.backend, default_backend());
        assert_eq!(config.driver.fixture, None);
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_load_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[driver]\nbackend = \"scripted\"\nfixture = \"devices.toml\"\n\n[output]\nformat = \"json\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.driver.backend, Backend::Scripted);
        let dir = file.path().parent().unwrap();
        assert_eq!(config.driver.fixture, Some(dir.join("devices.toml")));
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_fixture_relative_to_config_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("fixtures")).unwrap();
        std::fs::write(
            dir.path().join("fixtures/one.toml"),
            "[[device]]\nhandle = 0x10\n",
        )
        .unwrap();
        let path = dir.path().join("rcdevices.toml");
        std::fs::write(
            &path,
            "[driver]\nbackend = \"scripted\"\nfixture = \"fixtures/one.toml\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(
            config.driver.fixture,
            Some(dir.path().join("fixtures/one.toml"))
        );
        let provider = config.open_provider().unwrap();
        assert_eq!(provider.device_list(None).unwrap(), 1);
    }

    #[test]
    fn test_absolute_fixture_unchanged() {
        let dir = TempDir::new().unwrap();
        let fixture = dir.path().join("abs.toml");
        let path = dir.path().join("sub.toml");
        std::fs::write(
            &path,
            format!("[driver]\nfixture = {:?}\n", fixture.to_str().unwrap()),
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.driver.fixture, Some(fixture));
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str("[output]\nformat = \"json\"").unwrap();
        assert_eq!(config.driver.backend, default_backend());
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_scripted_backend_requires_fixture() {
        let config = Config {
            driver: DriverConfig {
                backend: Backend::Scripted,
                fixture: None,
            },
            output: OutputConfig::default(),
        };
        assert!(config.open_provider().is_err());
    }

    #[test]
    fn test_open_scripted_provider() {
        let mut fixture = NamedTempFile::new().unwrap();
        writeln!(fixture, "[[device]]\nhandle = 0x10\nserial = \"SN001\"").unwrap();

        let config = Config {
            driver: DriverConfig {
                backend: Backend::Scripted,
                fixture: Some(fixture.path().to_path_buf()),
            },
            output: OutputConfig::default(),
        };
        let provider = config.open_provider().unwrap();
        assert_eq!(provider.device_list(None).unwrap(), 1);
    }
}
