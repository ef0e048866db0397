//! Service configuration for asana-ci
//!
//! Merges command-line/environment values with the TOML file:
//! CLI → ENV → TOML → compiled default.

use asana_common::config::{RootFolderResolver, TomlConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_PORT: u16 = 5790;
pub const DEFAULT_BIND_HOST: &str = "127.0.0.1";
pub const DEFAULT_COLLABORATOR_URL: &str = "http://127.0.0.1:4000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Fully resolved runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub port: u16,
    pub bind_host: String,
    pub root_folder: PathBuf,
    pub collaborator_url: String,
    pub request_timeout: Duration,
}

impl ServiceConfig {
    /// `root_folder` and `collaborator_url` are the CLI values (clap already folds in
    /// their environment variables).
    pub fn resolve(
        port: u16,
        root_folder: Option<&Path>,
        collaborator_url: Option<&str>,
        toml: &TomlConfig,
    ) -> Self {
        Self::resolve_with(&RootFolderResolver::new(), port, root_folder, collaborator_url, toml)
    }

    pub fn resolve_with(
        resolver: &RootFolderResolver,
        port: u16,
        root_folder: Option<&Path>,
        collaborator_url: Option<&str>,
        toml: &TomlConfig,
    ) -> Self {
        let collaborator_url = match collaborator_url.filter(|u| !u.trim().is_empty()) {
            Some(url) => url.to_string(),
            None => {
                let url = toml
                    .collaborator_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COLLABORATOR_URL.to_string());
                info!(url = %url, "Collaborator URL not given on command line");
                url
            }
        };

        Self {
            port,
            bind_host: toml
                .bind_host
                .clone()
                .unwrap_or_else(|| DEFAULT_BIND_HOST.to_string()),
            root_folder: resolver.resolve(root_folder, toml),
            collaborator_url,
            request_timeout: Duration::from_secs(
                toml.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}
