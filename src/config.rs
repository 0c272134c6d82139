use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path, time::Duration};

use crate::{Error, InternalResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_ast_cache")]
    pub ast_cache: CacheConfig,

    #[serde(default = "default_result_cache")]
    pub result_cache: CacheConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ast_cache: default_ast_cache(),
            result_cache: default_result_cache(),
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> InternalResult<Self> {
        from_file(path)
    }

    /// Both caches switched off.
    pub fn uncached() -> Self {
        Self {
            ast_cache: CacheConfig {
                enabled: false,
                ..default_ast_cache()
            },
            result_cache: CacheConfig {
                enabled: false,
                ..default_result_cache()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Entries older than this are stale. Zero disables expiry.
    #[serde(default = "default_ttl", with = "duration_ms")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            capacity: default_capacity(),
            ttl: default_ttl(),
        }
    }
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> InternalResult<T> {
    let file = File::open(path)
        .map_err(|e| Error::Config(format!("Failed to open config file: {}", e)))?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> InternalResult<T> {
    let config = serde_json::from_str(s)
        .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

// defaults
fn default_true() -> bool {
    true
}
fn default_capacity() -> usize {
    1024
}
fn default_ttl() -> Duration {
    Duration::from_secs(600)
}
fn default_ast_cache() -> CacheConfig {
    CacheConfig::default()
}
fn default_result_cache() -> CacheConfig {
    CacheConfig {
        enabled: true,
        capacity: 4096,
        ttl: Duration::from_secs(60),
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
