//! Runtime settings.
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `WIPE_ATTEST_*` environment variables (nested keys use `__`).

use crate::algorithms::{FileWipe, DEFAULT_CHUNK_SIZE};
use crate::audit::verify::parse_display_offset;
use crate::crypto::PemKeyProvider;
use crate::{EraseMode, EraseOptions};
use anyhow::{anyhow, bail, Context, Result};
use chrono::FixedOffset;
use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "WIPE_ATTEST";
pub const LEDGER_FILE_NAME: &str = "wipe_history.json";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "wipe-attest")
}

/// Config file read when none is given explicitly
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ledger_path: PathBuf,
    /// Where signed JSON artifacts and rendered reports are written
    pub report_dir: PathBuf,
    pub private_key_path: Option<PathBuf>,
    pub public_key_path: Option<PathBuf>,
    pub passes: u32,
    pub chunk_size: usize,
    /// Offset used when showing `deleted_at`, e.g. `+05:30` or `UTC`
    pub display_offset: String,
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("wipe-attest-data"));

        Self {
            ledger_path: data_dir.join(LEDGER_FILE_NAME),
            report_dir: data_dir.join("reports"),
            private_key_path: None,
            public_key_path: None,
            passes: FileWipe::DEFAULT_PASSES,
            chunk_size: DEFAULT_CHUNK_SIZE,
            display_offset: "UTC".to_string(),
            dry_run: false,
        }
    }
}

impl Settings {
    pub fn erase_options(&self) -> EraseOptions {
        EraseOptions {
            passes: self.passes,
            chunk_size: self.chunk_size,
            mode: if self.dry_run {
                EraseMode::DryRun
            } else {
                EraseMode::Live
            },
        }
    }

    pub fn key_provider(&self) -> PemKeyProvider {
        PemKeyProvider::new(self.private_key_path.clone(), self.public_key_path.clone())
    }

    pub fn display_offset(&self) -> Result<FixedOffset> {
        parse_display_offset(&self.display_offset).ok_or_else(|| {
            anyhow!(
                "invalid display_offset {:?}: expected UTC, Z, +HH:MM or -HH:MM",
                self.display_offset
            )
        })
    }

    pub fn validate(&self) -> Result<()> {
        FileWipe::check_passes(self.passes)?;
        if self.chunk_size == 0 {
            bail!("chunk_size must be greater than zero");
        }
        self.display_offset()?;
        Ok(())
    }
}

/// Builds `Settings` from defaults, a TOML file and the environment
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    config_path: Option<PathBuf>,
    use_user_config: bool,
    env_prefix: String,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            use_user_config: true,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Read this file instead of the per-user one. It must exist.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip the per-user config file
    pub fn ignore_user_config(mut self) -> Self {
        self.use_user_config = false;
        self
    }

    pub fn load(&self) -> Result<Settings> {
        let defaults =
            Config::try_from(&Settings::default()).context("Failed to build default settings")?;
        let mut builder = Config::builder().add_source(defaults);

        match &self.config_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading config file");
                builder = builder.add_source(file_source(path).required(true));
            }
            None if self.use_user_config => {
                if let Some(path) = default_config_path().filter(|p| p.exists()) {
                    tracing::info!(path = %path.display(), "Loading config file");
                    builder = builder.add_source(file_source(&path).required(false));
                }
            }
            None => {}
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        settings.validate().context("Invalid configuration")?;
        tracing::debug!(?settings, "Settings loaded");
        Ok(settings)
    }
}

fn file_source(path: &Path) -> File<config::FileSourceFile, config::FileFormat> {
    File::from(path).format(config::FileFormat::Toml)
}
