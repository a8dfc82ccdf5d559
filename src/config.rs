use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;

use crate::error::ConfigError;

pub const DEFAULT_RAINDROP_API_URL: &str = "https://api.raindrop.io/rest/v1";
pub const DEFAULT_SYNC_TAG: &str = "1";
pub const DEFAULT_POST_TAG: &str = "raindrop";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Parser, Debug)]
#[command(name = "raindrop-sync")]
#[command(about = "Publishes the latest tagged Raindrop bookmark to WordPress", long_about = None)]
pub struct Cli {
    /// YAML config file; `${VAR}` placeholders are read from the environment.
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,

    /// Dotenv file to load before reading the environment.
    #[arg(long = "env-file")]
    pub env_file: Option<String>,

    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Run the pipeline once, print the outcome and exit.
    #[arg(long = "once", default_value_t = false)]
    pub once: bool,
}

#[derive(Clone, Deserialize)]
pub struct Config {
    pub wordpress_api_url: String,
    pub wordpress_username: String,
    pub wordpress_app_password: String,
    pub raindrop_api_key: String,
    pub sync_secret: String,
    #[serde(default = "default_raindrop_api_url")]
    pub raindrop_api_url: String,
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,
    #[serde(default = "default_post_tag")]
    pub post_tag: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_raindrop_api_url() -> String {
    DEFAULT_RAINDROP_API_URL.to_string()
}

fn default_sync_tag() -> String {
    DEFAULT_SYNC_TAG.to_string()
}

fn default_post_tag() -> String {
    DEFAULT_POST_TAG.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("wordpress_api_url", &self.wordpress_api_url)
            .field("wordpress_username", &self.wordpress_username)
            .field("wordpress_app_password", &"[redacted]")
            .field("raindrop_api_key", &"[redacted]")
            .field("sync_secret", &"[redacted]")
            .field("raindrop_api_url", &self.raindrop_api_url)
            .field("sync_tag", &self.sync_tag)
            .field("post_tag", &self.post_tag)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Loads from `path` when given, otherwise from the process environment.
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Config::load_config(path),
            None => Config::from_env(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::Missing(key.to_string()))
        };
        let optional = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port = match lookup("PORT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT".to_string(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let cfg = Config {
            wordpress_api_url: required("WORDPRESS_API_URL")?,
            wordpress_username: required("WORDPRESS_USERNAME")?,
            wordpress_app_password: required("WORDPRESS_APP_PASSWORD")?,
            raindrop_api_key: required("RAINDROP_API_KEY")?,
            sync_secret: required("SYNC_SECRET")?,
            raindrop_api_url: optional("RAINDROP_API_URL", DEFAULT_RAINDROP_API_URL),
            sync_tag: optional("RAINDROP_SYNC_TAG", DEFAULT_SYNC_TAG),
            post_tag: optional("WORDPRESS_POST_TAG", DEFAULT_POST_TAG),
            port,
        };

        Ok(cfg.normalized())
    }

    fn load_config(path: &str) -> Result<Config, ConfigError> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Config, ConfigError> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str);
        let cfg: Config = serde_yaml::from_str(&yaml_with_env)?;
        cfg.validate()?;
        Ok(cfg.normalized())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("wordpress_api_url", &self.wordpress_api_url),
            ("wordpress_username", &self.wordpress_username),
            ("wordpress_app_password", &self.wordpress_app_password),
            ("raindrop_api_key", &self.raindrop_api_key),
            ("sync_secret", &self.sync_secret),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name.to_string()));
            }
        }
        Ok(())
    }

    fn normalized(mut self) -> Self {
        self.wordpress_api_url = self.wordpress_api_url.trim_end_matches('/').to_string();
        self.raindrop_api_url = self.raindrop_api_url.trim_end_matches('/').to_string();
        self
    }

    fn substitute_env_vars(yaml_str: &str) -> String {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            let Some(end) = result[actual_start..].find('}') else {
                break;
            };
            let var_name = &result[actual_start + 2..actual_start + end];

            // ${VAR:-default}
            let env_value = if let Some(default_start) = var_name.find(":-") {
                let actual_var = &var_name[..default_start];
                let default_val = &var_name[default_start + 2..];
                env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
            } else {
                env::var(var_name).unwrap_or_else(|_| {
                    tracing::warn!(var = %var_name, "environment variable not found");
                    String::new()
                })
            };

            result.replace_range(actual_start..actual_start + end + 1, &env_value);
            offset = actual_start + env_value.len();
        }

        result
    }
}
