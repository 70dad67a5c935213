use super::schema::LucentConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Files checked by `load_default`, in order. The first one present wins.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./lucent.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".lucent").join("config.yaml"));
        }
        paths
    }

    /// Load the first config in `search_paths`, or the defaults when there is none.
    pub async fn load_default() -> Result<LucentConfig, ConfigError> {
        match Self::search_paths().into_iter().find(|p| p.exists()) {
            Some(path) => Self::load_from(&path).await,
            None => Ok(LucentConfig::default()),
        }
    }

    pub async fn load_from(path: &Path) -> Result<LucentConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn parse(content: &str) -> Result<LucentConfig, ConfigError> {
        let config: LucentConfig = serde_yaml::from_str(content)?;
        validate(&config)?;
        Ok(config)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn validate(config: &LucentConfig) -> Result<(), ConfigError> {
    let loading = &config.loading;
    if loading.delay_ms == 0 {
        return Err(invalid("loading.delay_ms", "must be greater than zero"));
    }
    if loading.delay_ms > loading.timeout_ms {
        return Err(invalid(
            "loading.delay_ms",
            format!("{}ms exceeds loading.timeout_ms ({}ms)", loading.delay_ms, loading.timeout_ms),
        ));
    }

    let waiter = &config.waiter;
    if waiter.timeout_ms == 0 {
        return Err(invalid("waiter.timeout_ms", "must be greater than zero"));
    }
    if waiter.quiet_ms >= waiter.timeout_ms {
        return Err(invalid(
            "waiter.quiet_ms",
            format!("{}ms leaves no room within waiter.timeout_ms ({}ms)", waiter.quiet_ms, waiter.timeout_ms),
        ));
    }

    if let Some(marker) = &config.resolver.marker_attribute {
        let valid = !marker.is_empty()
            && marker
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(invalid(
                "resolver.marker_attribute",
                format!("{:?} is not a usable attribute name", marker),
            ));
        }
    }
    Ok(())
}
