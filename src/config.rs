use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_JWT_TTL_DAYS: i64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    #[error("{name} has an invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn is_development(&self) -> bool {
        *self == AppEnv::Development
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnv::Development => "development",
            AppEnv::Production => "production",
        }
    }
}

impl FromStr for AppEnv {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "production" | "prod" => Ok(AppEnv::Production),
            _ => Err(()),
        }
    }
}

/// Where profile pictures go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetBackend {
    S3 { bucket: String, region: Option<String> },
    Local,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub app_env: AppEnv,
    /// `None` selects the in-process store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_days: i64,
    pub asset_backend: AssetBackend,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Reads the process environment; call after `dotenv().ok()`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::Empty("JWT_SECRET"));
        }

        // APP_ENV wins over NODE_ENV.
        let run_mode = ["APP_ENV", "NODE_ENV"]
            .into_iter()
            .find_map(|name| lookup(name).map(|value| (name, value)));
        let app_env = match run_mode {
            Some((name, value)) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value })?,
            None => AppEnv::Development,
        };

        let asset_backend = match lookup("AWS_S3_BUCKET").filter(|b| !b.is_empty()) {
            Some(bucket) => AssetBackend::S3 {
                bucket,
                region: lookup("AWS_REGION"),
            },
            None => AssetBackend::Local,
        };

        Ok(Config {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            app_env,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            jwt_secret,
            jwt_ttl_days: parse_or(&lookup, "JWT_TTL_DAYS", DEFAULT_JWT_TTL_DAYS)?,
            asset_backend,
            uploads_dir: lookup("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.database_url, None);
        assert_eq!(config.asset_backend, AssetBackend::Local);
        assert_eq!(config.jwt_ttl_days, 30);
    }

    #[test]
    fn jwt_secret_required() {
        assert!(matches!(config_from(&[]), Err(ConfigError::Missing("JWT_SECRET"))));
        assert!(matches!(
            config_from(&[("JWT_SECRET", "")]),
            Err(ConfigError::Empty("JWT_SECRET"))
        ));
    }

    #[test]
    fn s3_bucket_selects_s3_backend() {
        let config = config_from(&[
            ("JWT_SECRET", "s3cret"),
            ("AWS_S3_BUCKET", "profiles"),
            ("AWS_REGION", "ap-south-1"),
            ("APP_ENV", "production"),
            ("PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.app_env.is_development());
        assert_eq!(
            config.asset_backend,
            AssetBackend::S3 {
                bucket: "profiles".into(),
                region: Some("ap-south-1".into())
            }
        );
    }

    #[test]
    fn node_env_is_a_fallback_for_app_env() {
        let config = config_from(&[("JWT_SECRET", "s3cret"), ("NODE_ENV", "production")]).unwrap();
        assert_eq!(config.app_env, AppEnv::Production);

        let config = config_from(&[
            ("JWT_SECRET", "s3cret"),
            ("APP_ENV", "development"),
            ("NODE_ENV", "production"),
        ])
        .unwrap();
        assert_eq!(config.app_env, AppEnv::Development);

        assert!(matches!(
            config_from(&[("JWT_SECRET", "s3cret"), ("NODE_ENV", "staging")]),
            Err(ConfigError::Invalid { name: "NODE_ENV", .. })
        ));
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(matches!(
            config_from(&[("JWT_SECRET", "s3cret"), ("PORT", "http")]),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
    }
}
