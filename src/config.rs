//! Evaluator configuration
//!
//! Built once at start-up from defaults, an optional TOML file named by
//! `EVALUATOR_CONFIG`, and environment variable overrides (in that order).

use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

/// Limits for the sandboxed execution engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Native runtime binary
    pub node_binary: String,
    /// Budget for loading the submission and resolving its entry point
    pub resolution_timeout_ms: u64,
    /// Budget for a single test invocation
    pub case_timeout_ms: u64,
    /// Hard wall-clock budget for the whole run; the process is killed past it
    pub suite_wall_time_ms: u64,
    /// V8 heap ceiling
    pub memory_limit_mb: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            node_binary: "node".to_string(),
            resolution_timeout_ms: 1000,
            case_timeout_ms: 1000,
            suite_wall_time_ms: 10_000,
            memory_limit_mb: 256,
        }
    }
}

/// External execution simulator settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Endpoint of the simulator; `None` disables delegation
    pub url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub execution: ExecutionConfig,
    pub simulator: SimulatorConfig,
}

impl EvaluatorConfig {
    /// Load from the optional config file, then apply environment overrides
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var("EVALUATOR_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Apply overrides from a key lookup (the environment in production)
    fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_u64 = |key: &str| -> anyhow::Result<Option<u64>> {
            lookup(key)
                .map(|v| {
                    v.trim()
                        .parse::<u64>()
                        .with_context(|| format!("Invalid {}: {}", key, v))
                })
                .transpose()
        };

        if let Some(binary) = lookup("NODE_BINARY") {
            self.execution.node_binary = binary;
        }
        if let Some(v) = parse_u64("RESOLUTION_TIMEOUT_MS")? {
            self.execution.resolution_timeout_ms = v;
        }
        if let Some(v) = parse_u64("CASE_TIMEOUT_MS")? {
            self.execution.case_timeout_ms = v;
        }
        if let Some(v) = parse_u64("SUITE_WALL_TIME_MS")? {
            self.execution.suite_wall_time_ms = v;
        }
        if let Some(v) = parse_u64("MEMORY_LIMIT_MB")? {
            self.execution.memory_limit_mb =
                u32::try_from(v).with_context(|| format!("Invalid MEMORY_LIMIT_MB: {}", v))?;
        }
        if let Some(url) = lookup("SIMULATOR_URL") {
            self.simulator.url = if url.trim().is_empty() { None } else { Some(url) };
        }
        if let Some(v) = parse_u64("SIMULATOR_TIMEOUT_MS")? {
            self.simulator.timeout_ms = v;
        }

        Ok(())
    }
}

/// Global evaluator configuration
static EVALUATOR_CONFIG: OnceLock<EvaluatorConfig> = OnceLock::new();

/// Initialize the global configuration
pub fn init_config(config: EvaluatorConfig) -> anyhow::Result<&'static EvaluatorConfig> {
    EVALUATOR_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Evaluator configuration already initialized"))?;
    Ok(get_config())
}

/// Get the global configuration
pub fn get_config() -> &'static EvaluatorConfig {
    EVALUATOR_CONFIG.get().unwrap_or_else(|| {
        static DEFAULT: OnceLock<EvaluatorConfig> = OnceLock::new();

        warn!("Evaluator configuration not initialized, using default");
        DEFAULT.get_or_init(EvaluatorConfig::default)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[execution]
case_timeout_ms = 250

[simulator]
url = "http://simulator.local/simulate"
"#
        )
        .unwrap();

        let config = EvaluatorConfig::from_file(file.path()).unwrap();

        assert_eq!(config.execution.case_timeout_ms, 250);
        assert_eq!(config.execution.resolution_timeout_ms, 1000);
        assert_eq!(config.execution.node_binary, "node");
        assert_eq!(
            config.simulator.url.as_deref(),
            Some("http://simulator.local/simulate")
        );
        assert_eq!(config.simulator.timeout_ms, 30_000);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[execution]\ncase_timeout_ms = \"soon\"").unwrap();

        assert!(EvaluatorConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("NODE_BINARY", "/opt/node/bin/node"),
            ("SUITE_WALL_TIME_MS", "4000"),
            ("SIMULATOR_URL", ""),
        ]
        .into_iter()
        .collect();

        let mut config = EvaluatorConfig::default();
        config.simulator.url = Some("http://old".into());
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.execution.node_binary, "/opt/node/bin/node");
        assert_eq!(config.execution.suite_wall_time_ms, 4000);
        assert_eq!(config.simulator.url, None);
    }

    #[test]
    fn test_invalid_override_is_error() {
        let mut config = EvaluatorConfig::default();
        let result = config.apply_overrides(|k| (k == "CASE_TIMEOUT_MS").then(|| "fast".into()));
        assert!(result.is_err());
    }
}
