//! Configuration management for graphmail.

use std::fs;
use std::path::Path;

use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paths::AppPaths;

const APP_NAME: &str = "graphmail";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Timezone for displayed dates (e.g., "Europe/Berlin"). Dates stay in
    /// the provider's zone when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Mail listing configuration.
    #[serde(default)]
    pub mail: MailConfig,
    /// Console rendering configuration.
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timezone: None,
            mail: MailConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

/// Mail listing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Folder label used when a listing does not name one.
    pub default_folder: String,
    /// Maximum number of messages shown in listings.
    pub list_limit: usize,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            default_folder: "inbox".to_string(),
            list_limit: 10,
        }
    }
}

/// Console rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Width of the `=`/`-` rules around a rendered message.
    pub rule_width: usize,
    /// Use emoji markers; plain ASCII labels otherwise.
    pub emoji: bool,
    /// Show the body preview block above the content.
    pub show_preview: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            rule_width: 80,
            emoji: true,
            show_preview: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from paths with environment overlay.
    pub fn load(paths: &AppPaths) -> Result<Self> {
        let env_prefix = env_prefix();
        let mut builder = Config::builder()
            .add_source(
                File::from(paths.global_config.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                File::from(paths.local_config.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix(&env_prefix).separator("__"));

        if let Some(cli_cfg) = &paths.cli_config {
            builder = builder.add_source(
                File::from(cli_cfg.as_path())
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        let defaults = AppConfig::default();
        builder = builder
            .set_default("mail.default_folder", defaults.mail.default_folder)?
            .set_default("mail.list_limit", defaults.mail.list_limit as u64)?
            .set_default("display.rule_width", defaults.display.rule_width as u64)?
            .set_default("display.emoji", defaults.display.emoji)?
            .set_default("display.show_preview", defaults.display.show_preview)?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.timezone()?;
        Ok(config)
    }

    /// Parse the configured timezone, if any.
    pub fn timezone(&self) -> Result<Option<Tz>> {
        match self.timezone.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => name
                .parse::<Tz>()
                .map(Some)
                .map_err(|e| Error::Config(format!("invalid timezone '{name}': {e}"))),
        }
    }

    /// Write default config to a path.
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("creating config directory {parent:?}: {e}")))?;
        }
        let cfg = AppConfig::default();
        let toml = toml::to_string_pretty(&cfg)
            .map_err(|e| Error::Config(format!("serializing default config: {e}")))?;
        let mut content = String::new();
        content.push_str("# graphmail configuration\n");
        content.push_str(
            "# Place this file at $XDG_CONFIG_HOME/graphmail/config.toml (or ~/.config/graphmail/config.toml)\n",
        );
        content.push_str("# timezone = \"Europe/Berlin\"\n\n");
        content.push_str(&toml);
        content.push('\n');
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("writing config file to {}: {e}", path.display())))
    }

    /// Ensure default config exists, creating it if necessary.
    pub fn ensure_default(path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        Self::write_default(path)
    }
}

/// Generate environment variable prefix from app name.
fn env_prefix() -> String {
    APP_NAME
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
