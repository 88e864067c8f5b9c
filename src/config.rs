use log::LevelFilter;
use std::env;
use thiserror::Error;

pub struct Config {
    host: String,
    port: u16,
    log_level: LevelFilter,
}

mod rusty_env {
    pub const HOST: &str = "RUSTY_STUB_HOST";
    pub const PORT: &str = "RUSTY_STUB_PORT";
    pub const LOG_LEVEL: &str = "RUSTY_STUB_LOG_LEVEL";
}

impl Config {
    pub fn host(&self) -> &String {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn from_env() -> Result<Self, ConfigParsingError> {
        Config::from_lookup(|param_name| env::var(param_name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigParsingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |param_name: &str| {
            lookup(param_name)
                .ok_or_else(|| ConfigParsingError::MissingParameter(param_name.to_string()))
        };

        let host = required(rusty_env::HOST)?;
        let port = required(rusty_env::PORT)?.parse::<u16>().map_err(|_| {
            ConfigParsingError::InvalidParameterType {
                param_name: rusty_env::PORT.to_string(),
                expected: "u16".to_string(),
            }
        })?;
        let log_level = match lookup(rusty_env::LOG_LEVEL) {
            None => LevelFilter::Info,
            Some(level) => {
                level
                    .parse::<LevelFilter>()
                    .map_err(|_| ConfigParsingError::InvalidParameterType {
                        param_name: rusty_env::LOG_LEVEL.to_string(),
                        expected: "log level".to_string(),
                    })?
            }
        };

        Ok(Config {
            host,
            port,
            log_level,
        })
    }
}

#[derive(Error, Debug)]
pub enum ConfigParsingError {
    #[error("invalid type of parameter {param_name:?}, expected {expected:?}")]
    InvalidParameterType {
        param_name: String,
        expected: String,
    },

    #[error("missing parameter {0:?}")]
    MissingParameter(String),
}
