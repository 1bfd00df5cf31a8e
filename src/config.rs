use std::net::SocketAddr;
use std::path::PathBuf;

use secrecy::SecretString;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Per-service values used when the environment leaves something unset
#[derive(Debug, Clone, Copy)]
pub struct ServiceDefaults {
    pub name: &'static str,
    pub port: u16,
    pub s3_prefix: &'static str,
    pub model_path: &'static str,
    pub config_path: Option<&'static str>,
    pub style_encoder_path: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub region: String,
    pub access_key_id: Option<SecretString>,
    pub secret_access_key: Option<SecretString>,
    pub bucket: String,
    pub prefix: String,
}

#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub model: PathBuf,
    pub config: Option<PathBuf>,
    pub style_encoder: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub name: &'static str,
    pub host: String,
    pub port: u16,
    pub api_key: SecretString,
    pub storage: StorageConfig,
    pub models: ModelPaths,
    pub staging_dir: PathBuf,
    pub voices_dir: Option<PathBuf>,
}

impl ServiceConfig {
    /// Read the process environment once
    pub fn from_env(defaults: ServiceDefaults) -> Result<Self, ConfigError> {
        Self::from_lookup(defaults, |name| std::env::var(name).ok())
    }

    /// Build from any variable source; empty values count as unset
    pub fn from_lookup<F>(defaults: ServiceDefaults, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = var("API_KEY")
            .map(SecretString::from)
            .ok_or(ConfigError::Missing("API_KEY"))?;

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => defaults.port,
        };

        let storage = StorageConfig {
            region: var("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            access_key_id: var("AWS_ACCESS_KEY_ID").map(SecretString::from),
            secret_access_key: var("AWS_SECRET_ACCESS_KEY").map(SecretString::from),
            bucket: var("S3_BUCKET").unwrap_or_else(|| "elevenlabs-clone".to_string()),
            prefix: var("S3_PREFIX").unwrap_or_else(|| defaults.s3_prefix.to_string()),
        };

        let models = ModelPaths {
            model: var("MODEL_PATH")
                .unwrap_or_else(|| defaults.model_path.to_string())
                .into(),
            config: var("CONFIG_PATH")
                .or_else(|| defaults.config_path.map(str::to_string))
                .map(PathBuf::from),
            style_encoder: var("STYLE_ENCODER_PATH")
                .or_else(|| defaults.style_encoder_path.map(str::to_string))
                .map(PathBuf::from),
        };

        Ok(Self {
            name: defaults.name,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            api_key,
            storage,
            models,
            staging_dir: var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            voices_dir: var("VOICES_DIR").map(PathBuf::from),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: "HOST",
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    const DEFAULTS: ServiceDefaults = ServiceDefaults {
        name: "test-service",
        port: 8000,
        s3_prefix: "test-outputs",
        model_path: "models/test.onnx",
        config_path: None,
        style_encoder_path: Some("models/style.onnx"),
    };

    fn load(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(DEFAULTS, |name| vars.get(name).cloned())
    }

    #[test]
    fn requires_api_key() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("API_KEY"))));
        assert!(matches!(
            load(&[("API_KEY", "  ")]),
            Err(ConfigError::Missing("API_KEY"))
        ));
    }

    #[test]
    fn applies_defaults() {
        let config = load(&[("API_KEY", "secret")]).unwrap();

        assert_eq!(config.api_key.expose_secret(), "secret");
        assert_eq!(config.port, 8000);
        assert_eq!(config.storage.region, "us-east-1");
        assert_eq!(config.storage.bucket, "elevenlabs-clone");
        assert_eq!(config.storage.prefix, "test-outputs");
        assert!(config.storage.access_key_id.is_none());
        assert_eq!(config.models.model, PathBuf::from("models/test.onnx"));
        assert!(config.models.config.is_none());
        assert_eq!(
            config.models.style_encoder,
            Some(PathBuf::from("models/style.onnx"))
        );
        assert_eq!(config.addr().unwrap().to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = load(&[
            ("API_KEY", "secret"),
            ("PORT", "9100"),
            ("AWS_REGION", "eu-west-1"),
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_SECRET_ACCESS_KEY", "shh"),
            ("S3_BUCKET", "audio"),
            ("S3_PREFIX", "custom"),
            ("CONFIG_PATH", "cfg.json"),
            ("STAGING_DIR", "/var/tmp/staging"),
        ])
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.storage.region, "eu-west-1");
        assert_eq!(
            config.storage.access_key_id.as_ref().unwrap().expose_secret(),
            "AKIA"
        );
        assert_eq!(config.storage.bucket, "audio");
        assert_eq!(config.storage.prefix, "custom");
        assert_eq!(config.models.config, Some(PathBuf::from("cfg.json")));
        assert_eq!(config.staging_dir, PathBuf::from("/var/tmp/staging"));
    }

    #[test]
    fn rejects_bad_port() {
        let err = load(&[("API_KEY", "secret"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }
}
