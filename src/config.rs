//! Configuration for cgtbrain.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CGTBRAIN_HOME, CGTBRAIN_API_URL, ...)
//! 2. Config file (.cgtbrain/config.yaml)
//! 3. Defaults (~/.cgtbrain, production endpoints)
//!
//! Config file discovery:
//! - Searches current directory and parents for .cgtbrain/config.yaml
//! - The home path in the config file is relative to the .cgtbrain directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const DEFAULT_ANALYZE_URL: &str = "https://cgtbrain.com.au/analyze/";
const DEFAULT_FOLLOW_UP_URL: &str = "https://cgtbrain.com.au/follow-up/";
const DEFAULT_SHARE_URL: &str = "https://cgtbrain.com.au/api/timeline/save";
const DEFAULT_EMAIL_URL: &str = "https://cgtbrain.com.au/api/send-email";
const DEFAULT_SHARE_ORIGIN: &str = "https://cgtbrain.com.au";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub endpoints: Option<EndpointsConfig>,
    #[serde(default)]
    pub analysis: Option<AnalysisConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// App state directory (relative to config file)
    pub home: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    pub analyze_url: Option<String>,
    pub follow_up_url: Option<String>,
    pub share_url: Option<String>,
    pub email_url: Option<String>,
    /// Origin used when building share links ({origin}?share={id})
    pub share_origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub llm_provider: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to cgtbrain home (report catalog, flags)
    pub home: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Endpoint URLs
    pub endpoints: Endpoints,
    /// Analysis settings
    pub analysis: AnalysisSettings,
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub analyze_url: String,
    pub follow_up_url: String,
    pub share_url: String,
    pub email_url: String,
    pub share_origin: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            analyze_url: DEFAULT_ANALYZE_URL.to_string(),
            follow_up_url: DEFAULT_FOLLOW_UP_URL.to_string(),
            share_url: DEFAULT_SHARE_URL.to_string(),
            email_url: DEFAULT_EMAIL_URL.to_string(),
            share_origin: DEFAULT_SHARE_ORIGIN.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    /// Default LLM provider key sent with analysis requests
    pub llm_provider: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            llm_provider: "deepseek".to_string(),
            timeout_seconds: 300,
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".cgtbrain").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Override a URL from an environment variable, then the config file, then a default
fn pick_url(env_key: &str, file_value: Option<&String>, default: &str) -> String {
    if let Ok(value) = std::env::var(env_key) {
        return value;
    }
    file_value
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    // Default home directory
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".cgtbrain");

    // Check for config file
    let config_file = find_config_file();

    let (home, file_endpoints, file_analysis) = if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        // Resolve home path
        let home = if let Ok(env_home) = std::env::var("CGTBRAIN_HOME") {
            PathBuf::from(env_home)
        } else if let Some(ref home_path) = config.paths.home {
            // home is relative to the .cgtbrain/ directory
            let cgtbrain_dir = config_path.parent().unwrap_or(Path::new("."));
            resolve_path(cgtbrain_dir, home_path)
        } else {
            default_home.clone()
        };

        (home, config.endpoints, config.analysis)
    } else {
        let home = std::env::var("CGTBRAIN_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_home.clone());

        (home, None, None)
    };

    let endpoints = Endpoints {
        analyze_url: pick_url(
            "CGTBRAIN_API_URL",
            file_endpoints.as_ref().and_then(|e| e.analyze_url.as_ref()),
            DEFAULT_ANALYZE_URL,
        ),
        follow_up_url: pick_url(
            "CGTBRAIN_FOLLOW_UP_URL",
            file_endpoints
                .as_ref()
                .and_then(|e| e.follow_up_url.as_ref()),
            DEFAULT_FOLLOW_UP_URL,
        ),
        share_url: pick_url(
            "CGTBRAIN_SHARE_URL",
            file_endpoints.as_ref().and_then(|e| e.share_url.as_ref()),
            DEFAULT_SHARE_URL,
        ),
        email_url: pick_url(
            "CGTBRAIN_EMAIL_URL",
            file_endpoints.as_ref().and_then(|e| e.email_url.as_ref()),
            DEFAULT_EMAIL_URL,
        ),
        share_origin: pick_url(
            "CGTBRAIN_SHARE_ORIGIN",
            file_endpoints
                .as_ref()
                .and_then(|e| e.share_origin.as_ref()),
            DEFAULT_SHARE_ORIGIN,
        ),
    };

    let defaults = AnalysisSettings::default();
    let analysis = AnalysisSettings {
        llm_provider: std::env::var("CGTBRAIN_LLM_PROVIDER").unwrap_or_else(|_| {
            file_analysis
                .as_ref()
                .and_then(|a| a.llm_provider.clone())
                .unwrap_or(defaults.llm_provider)
        }),
        timeout_seconds: file_analysis
            .as_ref()
            .and_then(|a| a.timeout_seconds)
            .unwrap_or(defaults.timeout_seconds),
    };

    Ok(ResolvedConfig {
        home,
        config_file,
        endpoints,
        analysis,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

// ============================================================================
// Convenience functions
// ============================================================================

/// Get the cgtbrain home directory (report catalog, flags).
pub fn cgtbrain_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the report catalog path ($CGTBRAIN_HOME/reports.json)
pub fn catalog_path() -> Result<PathBuf> {
    Ok(config()?.home.join("reports.json"))
}

/// Get the directory where raw responses are archived ($CGTBRAIN_HOME/reports)
pub fn reports_dir() -> Result<PathBuf> {
    Ok(config()?.home.join("reports"))
}

/// Get the flags file path ($CGTBRAIN_HOME/flags.json)
pub fn flags_path() -> Result<PathBuf> {
    Ok(config()?.home.join("flags.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let cgtbrain_dir = temp.path().join(".cgtbrain");
        std::fs::create_dir_all(&cgtbrain_dir).unwrap();

        let config_path = cgtbrain_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./
endpoints:
  analyze_url: http://localhost:8000/analyze
  follow_up_url: http://localhost:8000/follow-up
analysis:
  llm_provider: claude
  timeout_seconds: 120
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.paths.home, Some("./".to_string()));

        let endpoints = config.endpoints.unwrap();
        assert_eq!(
            endpoints.analyze_url,
            Some("http://localhost:8000/analyze".to_string())
        );
        assert_eq!(
            endpoints.follow_up_url,
            Some("http://localhost:8000/follow-up".to_string())
        );

        let analysis = config.analysis.unwrap();
        assert_eq!(analysis.llm_provider, Some("claude".to_string()));
        assert_eq!(analysis.timeout_seconds, Some(120));
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::default();
        assert!(endpoints.follow_up_url.ends_with("/follow-up/"));
        assert!(endpoints.share_origin.starts_with("https://"));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }

    #[test]
    fn test_default_analysis_settings() {
        let settings = AnalysisSettings::default();
        assert_eq!(settings.llm_provider, "deepseek");
        assert_eq!(settings.timeout_seconds, 300);
    }
}
