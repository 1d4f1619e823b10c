use anyhow::Result;
use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "https://api.eyeson.team";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub observer: ObserverConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub api_key: String,
    /// Base REST endpoint; `None` falls back to the public API
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Channel subscribed to on the realtime socket
    pub channel: String,
    /// Capacity of the event buffer between receive loop and consumer
    pub buffer: usize,
    /// Upper bound for connect + subscribe, and for closing the socket
    pub handshake_timeout_secs: u64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            channel: "RoomChannel".to_string(),
            buffer: 16,
            handshake_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load from an optional config file, then apply `EYESON__*` environment overrides
    /// (e.g. `EYESON__API__API_KEY`).
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("EYESON").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.observer.channel, "RoomChannel");
        assert_eq!(cfg.observer.buffer, 16);
        assert_eq!(cfg.webhook.port, 8080);
        assert!(cfg.api.endpoint.is_none());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(
            file,
            "[api]\napi_key = \"secret\"\nendpoint = \"http://localhost:9000\"\n\n[observer]\nbuffer = 4"
        )?;

        let path = file.path().to_string_lossy().to_string();
        let cfg = Config::load(&path)?;

        assert_eq!(cfg.api.api_key, "secret");
        assert_eq!(cfg.api.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(cfg.observer.buffer, 4);
        // Untouched sections keep their defaults
        assert_eq!(cfg.observer.channel, "RoomChannel");
        assert_eq!(cfg.webhook.bind, "0.0.0.0");

        Ok(())
    }

    #[test]
    fn test_load_missing_file_uses_defaults() -> Result<()> {
        let cfg = Config::load("does/not/exist/eyeson")?;
        assert_eq!(cfg.observer.handshake_timeout_secs, 10);
        Ok(())
    }
}
