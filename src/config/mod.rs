mod file_config;

pub use file_config::{AggregatesConfig, DirectoryConfig, ExecutorConfig, FileConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_DIRECTORY_URL: &str = "https://api.audius.co";
pub const DEFAULT_FALLBACK_NODE: &str = "https://discoveryprovider.audius.co";
pub const DEFAULT_APP_NAME: &str = "atris";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub catalog_path: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub directory_url: Option<String>,
    pub fallback_nodes: Vec<String>,
    pub request_timeout_sec: Option<u64>,
    pub app_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub catalog_path: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,

    // Feature configs (with defaults)
    pub executor: ExecutorSettings,
    pub directory: DirectorySettings,
    pub aggregates: AggregateSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let catalog_path = file
            .catalog_path
            .map(PathBuf::from)
            .or_else(|| cli.catalog_path.clone());
        if let Some(path) = &catalog_path {
            if !path.is_file() {
                bail!("Catalog file does not exist: {:?}", path);
            }
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let executor = ExecutorSettings::resolve(cli, file.executor.unwrap_or_default())?;
        let directory = DirectorySettings::resolve(cli, file.directory.unwrap_or_default())?;

        let aggregates_file = file.aggregates.unwrap_or_default();
        let aggregates = AggregateSettings {
            batch_size: aggregates_file.batch_size.unwrap_or(100),
        };
        if aggregates.batch_size == 0 || aggregates.batch_size > 100 {
            bail!(
                "aggregates.batch_size must be between 1 and 100, got {}",
                aggregates.batch_size
            );
        }

        Ok(Self {
            catalog_path,
            port,
            metrics_port,
            logging_level,
            executor,
            directory,
            aggregates,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorSettings {
    /// Upper bound on distinct nodes tried for one call.
    pub max_node_attempts: u32,
    /// Attempts made against a single node before moving on.
    pub max_retries: u32,
    /// Delay unit between attempts on the same node; attempt `n` waits `n` units.
    pub retry_delay_ms: u64,
    pub request_timeout_sec: u64,
    pub app_name: String,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            max_node_attempts: 3,
            max_retries: 3,
            retry_delay_ms: 1000,
            request_timeout_sec: 30,
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

impl ExecutorSettings {
    fn resolve(cli: &CliConfig, file: ExecutorConfig) -> Result<Self> {
        let defaults = Self::default();
        let settings = Self {
            max_node_attempts: file.max_node_attempts.unwrap_or(defaults.max_node_attempts),
            max_retries: file.max_retries.unwrap_or(defaults.max_retries),
            retry_delay_ms: file.retry_delay_ms.unwrap_or(defaults.retry_delay_ms),
            request_timeout_sec: file
                .request_timeout_sec
                .or(cli.request_timeout_sec)
                .unwrap_or(defaults.request_timeout_sec),
            app_name: file
                .app_name
                .or_else(|| cli.app_name.clone())
                .unwrap_or(defaults.app_name),
        };
        if settings.max_node_attempts == 0 {
            bail!("executor.max_node_attempts must be at least 1");
        }
        if settings.max_retries == 0 {
            bail!("executor.max_retries must be at least 1");
        }
        if settings.app_name.trim().is_empty() {
            bail!("executor.app_name must not be empty");
        }
        Ok(settings)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectorySettings {
    pub url: String,
    /// Hosts used when the directory is unreachable or returns nothing.
    pub fallback_nodes: Vec<String>,
    pub timeout_sec: u64,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_DIRECTORY_URL.to_string(),
            fallback_nodes: vec![DEFAULT_FALLBACK_NODE.to_string()],
            timeout_sec: 10,
        }
    }
}

impl DirectorySettings {
    fn resolve(cli: &CliConfig, file: DirectoryConfig) -> Result<Self> {
        let defaults = Self::default();
        let fallback_nodes = match file.fallback_nodes {
            Some(nodes) => nodes,
            None if !cli.fallback_nodes.is_empty() => cli.fallback_nodes.clone(),
            None => defaults.fallback_nodes,
        };
        let settings = Self {
            url: file
                .url
                .or_else(|| cli.directory_url.clone())
                .unwrap_or(defaults.url),
            fallback_nodes,
            timeout_sec: file.timeout_sec.unwrap_or(defaults.timeout_sec),
        };

        if !is_http_url(&settings.url) {
            bail!("Directory url must be an http(s) url: {}", settings.url);
        }
        for node in &settings.fallback_nodes {
            if !is_http_url(node) {
                bail!("Fallback node must be an http(s) url: {}", node);
            }
        }
        Ok(settings)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSettings {
    pub batch_size: u32,
}

impl Default for AggregateSettings {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_cli() -> CliConfig {
        CliConfig {
            port: 3002,
            metrics_port: 9092,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("path"),
            Some(RequestsLoggingLevel::Path)
        ));
        assert!(matches!(
            parse_logging_level("BODY"),
            Some(RequestsLoggingLevel::Body)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(&make_cli(), None).unwrap();

        assert_eq!(config.port, 3002);
        assert_eq!(config.metrics_port, 9092);
        assert!(config.catalog_path.is_none());
        assert_eq!(config.executor, ExecutorSettings::default());
        assert_eq!(config.executor.max_node_attempts, 3);
        assert_eq!(config.executor.max_retries, 3);
        assert_eq!(config.executor.retry_delay_ms, 1000);
        assert_eq!(config.directory.url, DEFAULT_DIRECTORY_URL);
        assert_eq!(
            config.directory.fallback_nodes,
            vec![DEFAULT_FALLBACK_NODE.to_string()]
        );
        assert_eq!(config.aggregates.batch_size, 100);
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let cli = CliConfig {
            directory_url: Some("http://cli-directory".to_string()),
            app_name: Some("cli-app".to_string()),
            fallback_nodes: vec!["http://cli-node".to_string()],
            logging_level: RequestsLoggingLevel::Path,
            ..make_cli()
        };
        let file_config = FileConfig {
            port: Some(4000),
            logging_level: Some("headers".to_string()),
            executor: Some(ExecutorConfig {
                app_name: Some("toml-app".to_string()),
                retry_delay_ms: Some(0),
                ..Default::default()
            }),
            directory: Some(DirectoryConfig {
                url: Some("http://toml-directory".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.executor.app_name, "toml-app");
        assert_eq!(config.executor.retry_delay_ms, 0);
        assert_eq!(config.directory.url, "http://toml-directory");
        // CLI value used when TOML doesn't specify
        assert_eq!(config.metrics_port, 9092);
        assert_eq!(
            config.directory.fallback_nodes,
            vec!["http://cli-node".to_string()]
        );
    }

    #[test]
    fn test_resolve_missing_catalog_file_error() {
        let cli = CliConfig {
            catalog_path: Some(PathBuf::from("/nonexistent/endpoints.json")),
            ..make_cli()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_existing_catalog_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            catalog_path: Some(file.path().to_path_buf()),
            ..make_cli()
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.catalog_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_resolve_zero_retries_error() {
        let file_config = FileConfig {
            executor: Some(ExecutorConfig {
                max_retries: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let result = AppConfig::resolve(&make_cli(), Some(file_config));
        assert!(result.unwrap_err().to_string().contains("max_retries"));
    }

    #[test]
    fn test_resolve_bad_directory_url_error() {
        let cli = CliConfig {
            directory_url: Some("ftp://nope".to_string()),
            ..make_cli()
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_resolve_batch_size_bounds() {
        let file_config = FileConfig {
            aggregates: Some(AggregatesConfig {
                batch_size: Some(500),
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&make_cli(), Some(file_config)).is_err());
    }
}
