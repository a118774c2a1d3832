//! Configuration loading and management

use crate::core::listing::{NewPlot, NewRentalHouse};
use crate::core::service::Credentials;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind (e.g., "127.0.0.1:8080")
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// Change notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast buffer per collection before slow receivers lag
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    1024
}

/// Presentation settings for listing responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsConfig {
    /// Image reference shown when a listing has no images
    #[serde(default = "default_placeholder")]
    pub placeholder_image: String,

    /// Number of listings per collection on the home page
    #[serde(default = "default_featured")]
    pub featured_count: usize,

    /// Number of similar listings on a detail page
    #[serde(default = "default_similar")]
    pub similar_count: usize,
}

impl Default for ListingsConfig {
    fn default() -> Self {
        Self {
            placeholder_image: default_placeholder(),
            featured_count: default_featured(),
            similar_count: default_similar(),
        }
    }
}

fn default_placeholder() -> String {
    "/placeholder.svg".to_string()
}

fn default_featured() -> usize {
    6
}

fn default_similar() -> usize {
    3
}

/// Records inserted into an empty store at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub plots: Vec<NewPlot>,
    #[serde(default)]
    pub rentals: Vec<NewRentalHouse>,
}

/// Listing store backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Process-local store, optionally seeded
    InMemory {
        #[serde(default)]
        admins: Vec<Credentials>,
        #[serde(default)]
        seed: SeedData,
    },

    /// PostgREST-compatible hosted store (requires the `rest` feature)
    Rest {
        url: String,
        api_key: String,
        #[serde(default = "default_plots_table")]
        plots_table: String,
        #[serde(default = "default_rentals_table")]
        rentals_table: String,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::InMemory {
            admins: Vec::new(),
            seed: SeedData::default(),
        }
    }
}

fn default_plots_table() -> String {
    "plots".to_string()
}

fn default_rentals_table() -> String {
    "rental_houses".to_string()
}

/// Complete site configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub listings: ListingsConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

impl SiteConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_yaml_str(&content).with_context(|| format!("Invalid config file {}", path))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.server.bind))
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        if self.events.capacity == 0 {
            anyhow::bail!("events.capacity must be greater than zero");
        }
        Ok(())
    }
}
