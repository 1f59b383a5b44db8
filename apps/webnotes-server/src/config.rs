//! Configuration management for the WebNotes server

use serde::Deserialize;
use std::env;

use crate::annotations::{StoreConfig, DEFAULT_STORAGE_KEY};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub store: AnnotationStoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationStoreConfig {
    /// Key the annotation list is stored under
    pub key: String,
    /// Pending writes allowed before callers wait
    pub write_queue_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite:./webnotes.db".to_string(),
            },
            store: AnnotationStoreConfig {
                key: DEFAULT_STORAGE_KEY.to_string(),
                write_queue_size: 64,
            },
        }
    }
}

impl Config {
    /// Read settings from the environment, defaulting anything unset or
    /// unparseable
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port: lookup("SERVER_PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            store: AnnotationStoreConfig {
                key: lookup("STORAGE_KEY")
                    .filter(|k| !k.trim().is_empty())
                    .unwrap_or(defaults.store.key),
                write_queue_size: lookup("WRITE_QUEUE_SIZE")
                    .and_then(|v| v.parse().ok())
                    .filter(|&n: &usize| n > 0)
                    .unwrap_or(defaults.store.write_queue_size),
            },
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            key: self.store.key.clone(),
            write_queue_size: self.store.write_queue_size,
        }
    }
}
