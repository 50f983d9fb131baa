use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

// Decision service configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct VerdictConfig {
    // HTTP bind address for the decision API.
    pub bind_addr: SocketAddr,
    // Metrics HTTP bind address.
    pub metrics_bind: SocketAddr,
    // SQLite database URL; unset selects the in-memory store.
    pub database_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerdictConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    database_url: Option<String>,
}

impl VerdictConfig {
    pub fn from_env() -> Result<Self> {
        // Environment variables provide defaults for local development.
        let bind_addr = std::env::var("VERDICT_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse VERDICT_BIND")?;
        let metrics_bind = std::env::var("VERDICT_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:9090".to_string())
            .parse()
            .with_context(|| "parse VERDICT_METRICS_BIND")?;
        let database_url = std::env::var("VERDICT_DB").ok().filter(|url| !url.is_empty());
        Ok(Self {
            bind_addr,
            metrics_bind,
            database_url,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("VERDICT_CONFIG") {
            // YAML overrides allow ops-friendly config files.
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read VERDICT_CONFIG: {path}"))?;
            let override_cfg: VerdictConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse verdict config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.metrics_bind {
                config.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
            }
            if let Some(value) = override_cfg.database_url {
                config.database_url = Some(value);
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    // Helper to clear all Verdict env vars
    fn clear_verdict_env() {
        for (key, _) in env::vars() {
            if key.starts_with("VERDICT_") {
                unsafe {
                    env::remove_var(key);
                }
            }
        }
    }

    #[serial]
    #[test]
    fn from_env_uses_defaults() {
        clear_verdict_env();
        let config = VerdictConfig::from_env().expect("from_env");
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.metrics_bind.to_string(), "0.0.0.0:9090");
        assert!(config.database_url.is_none());
    }

    #[serial]
    #[test]
    fn from_env_respects_env_vars() {
        clear_verdict_env();
        unsafe {
            env::set_var("VERDICT_BIND", "127.0.0.1:9443");
            env::set_var("VERDICT_METRICS_BIND", "127.0.0.1:9091");
            env::set_var("VERDICT_DB", "sqlite://verdict.db");
        }

        let config = VerdictConfig::from_env().expect("from_env");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9443");
        assert_eq!(config.metrics_bind.to_string(), "127.0.0.1:9091");
        assert_eq!(config.database_url.as_deref(), Some("sqlite://verdict.db"));

        clear_verdict_env();
    }

    #[serial]
    #[test]
    fn from_env_rejects_invalid_socket_addr() {
        clear_verdict_env();
        unsafe {
            env::set_var("VERDICT_BIND", "not-a-valid-address");
        }
        assert!(VerdictConfig::from_env().is_err());
        clear_verdict_env();
    }

    #[serial]
    #[test]
    fn from_env_or_yaml_overrides_with_valid_yaml() {
        clear_verdict_env();
        let tmpdir = TempDir::new().unwrap();
        let config_path = tmpdir.path().join("config.yml");
        fs::write(
            &config_path,
            r#"
bind_addr: "127.0.0.1:7443"
database_url: "sqlite:///var/lib/verdict/verdict.db"
"#,
        )
        .unwrap();
        unsafe {
            env::set_var("VERDICT_CONFIG", config_path.to_str().unwrap());
        }

        let config = VerdictConfig::from_env_or_yaml().expect("from_env_or_yaml");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:7443");
        assert_eq!(config.metrics_bind.to_string(), "0.0.0.0:9090");
        assert_eq!(
            config.database_url.as_deref(),
            Some("sqlite:///var/lib/verdict/verdict.db")
        );

        clear_verdict_env();
    }

    #[serial]
    #[test]
    fn from_env_or_yaml_file_not_found_fails() {
        clear_verdict_env();
        let tmpdir = TempDir::new().unwrap();
        let nonexistent = tmpdir.path().join("nonexistent.yml");
        unsafe {
            env::set_var("VERDICT_CONFIG", nonexistent.to_str().unwrap());
        }
        assert!(VerdictConfig::from_env_or_yaml().is_err());
        clear_verdict_env();
    }

    #[serial]
    #[test]
    fn from_env_or_yaml_invalid_yaml_fails() {
        clear_verdict_env();
        let tmpdir = TempDir::new().unwrap();
        let config_path = tmpdir.path().join("bad.yml");
        fs::write(&config_path, "this is not: valid: yaml:").unwrap();
        unsafe {
            env::set_var("VERDICT_CONFIG", config_path.to_str().unwrap());
        }

        assert!(VerdictConfig::from_env_or_yaml().is_err());

        clear_verdict_env();
    }
}
