use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default thresholds applied to accounts that do not override them.
///
/// `max_attempts = 0` disables automatic freezing; `freeze_time` is the base
/// freeze window in milliseconds and `0` disables the backoff entirely.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WardenConfig {
    #[serde(default)]
    pub max_attempts: u32,
    #[serde(default)]
    pub freeze_time: i64,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            freeze_time: 0,
        }
    }
}

impl WardenConfig {
    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!("Error parsing config {}: {}. Using defaults.", path, e);
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("Error reading config {}: {}. Using defaults.", path, e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }
}
