use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub origin: OriginConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Cache file written by the external ingestion process
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
}

fn default_index_path() -> PathBuf {
    PathBuf::from("./m3u8_index_cache.json")
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OriginConfig {
    /// Streaming origin prefix; the URL-escaped segment filename is
    /// appended to form the manifest URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "https://127.0.0.1:6969/m3u8/".to_string()
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}
