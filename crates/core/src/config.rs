//! Configuration management for promptd.
//!
//! Configuration is merged from several sources, lowest precedence first:
//! - Built-in defaults
//! - A YAML config file (`promptd.yaml` in the working directory, or `PROMPTD_CONFIG`)
//! - Environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "promptd.yaml";

/// Main server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Root directory scanned for template files
    pub prompts_dir: PathBuf,

    /// Text file served by `get_prompt_generate_rule`
    pub rule_file: PathBuf,

    /// HTTP listen address; `None` serves on stdio
    pub addr: Option<String>,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    prompts: Option<PromptsSection>,
    server: Option<ServerSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PromptsSection {
    dir: Option<String>,
    #[serde(rename = "ruleFile")]
    rule_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerSection {
    addr: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            prompts_dir: PathBuf::from("prompts"),
            rule_file: PathBuf::from("generate_rule.txt"),
            addr: None,
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `PROMPTD_CONFIG`: Path to config file
    /// - `PROMPTD_PROMPTS_DIR`: Template root directory
    /// - `PROMPTD_RULE_FILE`: Rule text file
    /// - `PROMPTD_ADDR`: HTTP listen address
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_from(None)
    }

    /// Like [`ServerConfig::load`], reading `config_file` instead of the
    /// default file when given. A config file named explicitly must exist.
    pub fn load_from(config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        config.config_file =
            config_file.or_else(|| std::env::var("PROMPTD_CONFIG").ok().map(PathBuf::from));

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        if let Ok(dir) = std::env::var("PROMPTD_PROMPTS_DIR") {
            config.prompts_dir = PathBuf::from(dir);
        }

        if let Ok(rule_file) = std::env::var("PROMPTD_RULE_FILE") {
            config.rule_file = PathBuf::from(rule_file);
        }

        if let Ok(addr) = std::env::var("PROMPTD_ADDR") {
            if !addr.is_empty() {
                config.addr = Some(addr);
            }
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> Result<Self, serde_yaml::Error> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(prompts) = config_file.prompts {
            if let Some(dir) = prompts.dir {
                result.prompts_dir = PathBuf::from(dir);
            }
            if let Some(rule_file) = prompts.rule_file {
                result.rule_file = PathBuf::from(rule_file);
            }
        }

        if let Some(server) = config_file.server {
            result.addr = server.addr.filter(|a| !a.is_empty());
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        prompts_dir: Option<PathBuf>,
        rule_file: Option<PathBuf>,
        addr: Option<String>,
        stdio: bool,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(prompts_dir) = prompts_dir {
            self.prompts_dir = prompts_dir;
        }

        if let Some(rule_file) = rule_file {
            self.rule_file = rule_file;
        }

        if let Some(addr) = addr {
            self.addr = Some(addr).filter(|a| !a.is_empty());
        }

        // --stdio wins over any configured address
        if stdio {
            self.addr = None;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Check that the template root is usable.
    pub fn validate(&self) -> AppResult<()> {
        if self.prompts_dir.as_os_str().is_empty() {
            return Err(AppError::Config(
                "Prompts directory cannot be empty".to_string(),
            ));
        }

        if !self.prompts_dir.is_dir() {
            return Err(AppError::Config(format!(
                "Prompts directory does not exist: {:?}",
                self.prompts_dir
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.prompts_dir, PathBuf::from("prompts"));
        assert_eq!(config.rule_file, PathBuf::from("generate_rule.txt"));
        assert!(config.addr.is_none());
        assert!(!config.verbose);
    }

    #[test]
    fn test_merge_yaml_sections() {
        let yaml = r#"
prompts:
  dir: /srv/prompts
  ruleFile: /srv/rule.txt
server:
  addr: ":8888"
logging:
  level: warn
  color: false
"#;
        let merged = ServerConfig::default().merge_yaml_str(yaml).unwrap();
        assert_eq!(merged.prompts_dir, PathBuf::from("/srv/prompts"));
        assert_eq!(merged.rule_file, PathBuf::from("/srv/rule.txt"));
        assert_eq!(merged.addr.as_deref(), Some(":8888"));
        assert_eq!(merged.log_level.as_deref(), Some("warn"));
        assert!(merged.no_color);
    }

    #[test]
    fn test_with_overrides() {
        let config = ServerConfig::default().with_overrides(
            Some(PathBuf::from("/tmp/p")),
            None,
            Some("127.0.0.1:9000".to_string()),
            false,
            None,
            true,
            false,
        );

        assert_eq!(config.prompts_dir, PathBuf::from("/tmp/p"));
        assert_eq!(config.addr.as_deref(), Some("127.0.0.1:9000"));
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_stdio_flag_clears_addr() {
        let mut config = ServerConfig::default();
        config.addr = Some(":8888".to_string());
        let config = config.with_overrides(None, None, None, true, None, false, false);
        assert!(config.addr.is_none());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.yaml");
        std::fs::write(&path, "prompts:\n  dir: /data/prompts\n").unwrap();

        let config = ServerConfig::load_from(Some(path.clone())).unwrap();
        assert_eq!(config.config_file, Some(path));
        if std::env::var("PROMPTD_PROMPTS_DIR").is_err() {
            assert_eq!(config.prompts_dir, PathBuf::from("/data/prompts"));
        }

        let missing = ServerConfig::load_from(Some(temp_dir.path().join("nope.yaml")));
        assert!(matches!(missing, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ServerConfig::default();
        config.prompts_dir = temp_dir.path().join("absent");
        assert!(config.validate().is_err());

        config.prompts_dir = temp_dir.path().to_path_buf();
        assert!(config.validate().is_ok());
    }
}
