use std::env;

use thiserror::Error;

use crate::change_feed::DEFAULT_CAPACITY;
use crate::domain::order::OrderStatus;
use crate::domain::payment::TipBase;

/// Errors raised while reading the server configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub database_url: String,
    pub address: String,
    pub port: u16,
    /// Status new orders are created in.
    pub initial_order_status: OrderStatus,
    /// Subtotal percentage tips are computed from.
    pub tip_base: TipBase,
    /// Events buffered per change-feed subscriber.
    pub change_feed_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: "app.db".to_string(),
            address: "127.0.0.1".to_string(),
            port: 8080,
            initial_order_status: OrderStatus::default(),
            tip_base: TipBase::default(),
            change_feed_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read the configuration through `lookup`, falling back to defaults for
    /// unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let initial_order_status = match lookup("INITIAL_ORDER_STATUS") {
            Some(value) => {
                let status: OrderStatus = parse("INITIAL_ORDER_STATUS", &value)?;
                if status.is_terminal() {
                    return Err(ConfigError::InvalidValue {
                        name: "INITIAL_ORDER_STATUS",
                        value,
                        reason: "orders cannot start in a terminal status".to_string(),
                    });
                }
                status
            }
            None => defaults.initial_order_status,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            address: lookup("ADDRESS").unwrap_or(defaults.address),
            port: lookup("PORT")
                .map(|value| parse::<u16>("PORT", &value))
                .transpose()?
                .unwrap_or(defaults.port),
            initial_order_status,
            tip_base: lookup("TIP_BASE")
                .map(|value| parse::<TipBase>("TIP_BASE", &value))
                .transpose()?
                .unwrap_or(defaults.tip_base),
            change_feed_capacity: lookup("CHANGE_FEED_CAPACITY")
                .map(|value| parse::<usize>("CHANGE_FEED_CAPACITY", &value))
                .transpose()?
                .unwrap_or(defaults.change_feed_capacity),
        })
    }
}

fn parse<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|err| ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: err.to_string(),
        })
}
