use crate::server::{error::config::ConfigError, model::app::DEFAULT_USERNAME};

pub static DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub default_username: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_address: optional("BIND_ADDRESS", DEFAULT_BIND_ADDRESS)?,
            default_username: optional("DEFAULT_USERNAME", DEFAULT_USERNAME)?,
        })
    }
}

fn required(var: &str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) | Err(std::env::VarError::NotPresent) => {
            Err(ConfigError::MissingEnvVar(var.to_string()))
        }
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnvValue {
            var: var.to_string(),
            reason: "value is not valid unicode".to_string(),
        }),
    }
}

fn optional(var: &str, default: &str) -> Result<String, ConfigError> {
    match required(var) {
        Err(ConfigError::MissingEnvVar(_)) => Ok(default.to_string()),
        result => result,
    }
}
