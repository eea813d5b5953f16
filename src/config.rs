//! Configuration for gitshelf
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (GITSHELF_*)
//! 3. Config file (~/.config/gitshelf/config.toml, or `--config`)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3456,
        }
    }
}

/// Where repositories live and how `git` is invoked
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitConfig {
    /// Directory whose immediate subdirectories are served
    pub root: PathBuf,

    /// `git` executable used by the Smart HTTP endpoints
    pub binary: String,

    /// Largest accepted upload-pack/receive-pack request body, in bytes
    pub max_request_body: usize,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            root: dirs::home_dir()
                .map(|home| home.join("Projects"))
                .unwrap_or_else(|| PathBuf::from("Projects")),
            binary: "git".to_string(),
            max_request_body: 512 * 1024 * 1024,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Site title shown on the index
    pub title: String,

    pub description: String,

    pub server: ServerConfig,

    pub git: GitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "Git repositories".to_string(),
            description: "Publish your git repositories with ease".to_string(),
            server: ServerConfig::default(),
            git: GitConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location when
    /// no path is given.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Returns `~/.config/gitshelf/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitshelf").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - GITSHELF_TITLE, GITSHELF_DESCRIPTION: Site metadata
    /// - GITSHELF_HOST, GITSHELF_PORT: Listener address
    /// - GITSHELF_ROOT: Repository root directory
    /// - GITSHELF_GIT: `git` executable
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`, keyed by environment
    /// variable name.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(title) = lookup("GITSHELF_TITLE") {
            self.title = title;
        }
        if let Some(description) = lookup("GITSHELF_DESCRIPTION") {
            self.description = description;
        }
        if let Some(host) = lookup("GITSHELF_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("GITSHELF_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring GITSHELF_PORT={}: not a port number", port),
            }
        }
        if let Some(root) = lookup("GITSHELF_ROOT") {
            self.git.root = PathBuf::from(root);
        }
        if let Some(binary) = lookup("GITSHELF_GIT") {
            self.git.binary = binary;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        root: Option<PathBuf>,
        host: Option<String>,
        port: Option<u16>,
    ) -> Self {
        if let Some(root) = root {
            self.git.root = root;
        }
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }

        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.title, "Git repositories");
        assert_eq!(config.server.port, 3456);
        assert_eq!(config.git.binary, "git");
        assert!(config.git.root.ends_with("Projects"));
        assert_eq!(config.bind_address(), "127.0.0.1:3456");
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
title = "Team repos"

[git]
root = "/srv/git"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.title, "Team repos");
        assert_eq!(config.git.root, PathBuf::from("/srv/git"));
        // Everything else keeps its default
        assert_eq!(config.git.binary, "git");
        assert_eq!(config.server.port, 3456);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nhost = \"0.0.0.0\"\nport = 8080\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_invalid_toml_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        assert!(matches!(Config::load_from_file(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GITSHELF_TITLE", "Mirror"),
            ("GITSHELF_PORT", "9000"),
            ("GITSHELF_ROOT", "/var/repos"),
            ("GITSHELF_GIT", "/opt/git/bin/git"),
        ]
        .into_iter()
        .collect();

        let config = Config::default().with_overrides_from(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.title, "Mirror");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.git.root, PathBuf::from("/var/repos"));
        assert_eq!(config.git.binary, "/opt/git/bin/git");
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_bad_port_in_env_is_ignored() {
        let config = Config::default()
            .with_overrides_from(|key| (key == "GITSHELF_PORT").then(|| "http".to_string()));
        assert_eq!(config.server.port, 3456);
    }

    #[test]
    fn test_cli_beats_env() {
        let config = Config::default()
            .with_overrides_from(|key| (key == "GITSHELF_PORT").then(|| "9000".to_string()))
            .with_cli_overrides(Some(PathBuf::from("/tmp/repos")), None, Some(7000));

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.git.root, PathBuf::from("/tmp/repos"));
    }
}
