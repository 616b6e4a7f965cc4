//! Configuration for the linsim host process.
//!
//! Configuration is loaded from `~/.config/linsim/linsim.toml` unless a path
//! is given with `--config`. Every key is optional.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use linsim_kernel::HostInfo;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fully qualified host name.
    pub hostname: String,

    /// Defaults to the first label of `hostname`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    /// Defaults to everything after the first label of `hostname`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,

    /// SQLite database holding the filesystem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Name the shell reports in diagnostics, e.g. `-bash: foo: command not found`.
    pub shell_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel_release: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,

    pub services: ServiceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hostname: "localhost.localdomain".to_string(),
            short_name: None,
            domain_name: None,
            database: None,
            log_file: None,
            log_filter: "info".to_string(),
            shell_name: "-bash".to_string(),
            kernel_release: None,
            kernel_version: None,
            machine: None,
            services: ServiceConfig::default(),
        }
    }
}

/// Listener addresses and ports. Port 0 disables a listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub listen_address: String,
    pub echo: u16,
    pub discard: u16,
    pub daytime: u16,
    pub chargen: u16,
    pub time: u16,
    pub telnet: u16,
    /// Account telnet sessions are logged in as.
    pub telnet_user: String,
    pub http: u16,
    /// Tree directory served over HTTP.
    pub http_root: String,
    /// `Server:` header value.
    pub http_server: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            echo: 7,
            discard: 9,
            daytime: 13,
            chargen: 19,
            time: 37,
            telnet: 23,
            telnet_user: "root".to_string(),
            http: 80,
            http_root: "/var/www/html".to_string(),
            http_server: "Apache/2.4.57 (Debian)".to_string(),
        }
    }
}

impl Config {
    /// Load from `explicit`, or from the default path when it exists.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        let path = Self::config_path()?;
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the default config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("linsim.toml"))
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("filesystem.db")),
        }
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("linsim.log")),
        }
    }

    /// Copy with every derived value filled in, for display.
    pub fn effective(&self) -> Result<Self> {
        let host = self.host_info();
        Ok(Self {
            short_name: Some(host.short_name),
            domain_name: Some(host.domain_name),
            database: Some(self.database_path()?),
            log_file: Some(self.log_path()?),
            kernel_release: Some(host.kernel_release),
            kernel_version: Some(host.kernel_version),
            machine: Some(host.machine),
            ..self.clone()
        })
    }

    /// Identity the shell and `uname` report.
    pub fn host_info(&self) -> HostInfo {
        let mut host = HostInfo::new(self.hostname.clone());
        if let Some(short) = &self.short_name {
            host.short_name = short.clone();
        }
        if let Some(domain) = &self.domain_name {
            host.domain_name = domain.clone();
        }
        if let Some(release) = &self.kernel_release {
            host.kernel_release = release.clone();
        }
        if let Some(version) = &self.kernel_version {
            host.kernel_version = version.clone();
        }
        if let Some(machine) = &self.machine {
            host.machine = machine.clone();
        }
        host.shell_name = self.shell_name.clone();
        host
    }

    /// Pretty TOML rendering.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "linsim").context("Could not determine config directory")
}
