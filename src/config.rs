use governor::Quota;
use std::env;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::query::Target;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("scoreboard rate limit period must be greater than zero")]
    ZeroPeriod,
    #[error("scoreboard rate limit burst must be greater than zero")]
    ZeroBurst,
    #[error("could not resolve game server address {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("game server address {0} resolved to nothing")]
    NoAddress(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    // HTTP listener
    pub bind_address: String,
    pub port: u16,

    // Game server
    pub game_server_address: String,
    pub query_timeout_ms: u64,

    pub template_path: String,

    // Rate limiting of scoreboard requests per client IP
    pub scoreboard_period_secs: u64,
    pub scoreboard_burst_limit: u32,
    // Take the client IP from X-Forwarded-For / Forwarded instead of the peer address
    pub trust_forwarded_for: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 80,
            game_server_address: "localhost:28785".to_string(),
            query_timeout_ms: 1000,
            template_path: "templates/index.html".to_string(),
            scoreboard_period_secs: 1,
            scoreboard_burst_limit: 30,
            trust_forwarded_for: false,
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or unparsable keys keep
    /// their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port: parse_or(lookup("PORT"), defaults.port),
            game_server_address: lookup("GAME_SERVER_ADDRESS").unwrap_or(defaults.game_server_address),
            query_timeout_ms: parse_or(lookup("QUERY_TIMEOUT_MS"), defaults.query_timeout_ms),
            template_path: lookup("TEMPLATE_PATH").unwrap_or(defaults.template_path),
            scoreboard_period_secs: parse_or(lookup("SCOREBOARD_PERIOD_SECS"), defaults.scoreboard_period_secs),
            scoreboard_burst_limit: parse_or(lookup("SCOREBOARD_BURST_LIMIT"), defaults.scoreboard_burst_limit),
            trust_forwarded_for: parse_or(lookup("TRUST_FORWARDED_FOR"), defaults.trust_forwarded_for),
        }
    }

    pub fn bind(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn scoreboard_quota(&self) -> Result<Quota, ConfigError> {
        let quota = Quota::with_period(Duration::from_secs(self.scoreboard_period_secs))
            .ok_or(ConfigError::ZeroPeriod)?;
        let burst = NonZeroU32::new(self.scoreboard_burst_limit).ok_or(ConfigError::ZeroBurst)?;
        Ok(quota.allow_burst(burst))
    }

    /// Resolves the game server address once; the result is used for the
    /// lifetime of the process.
    pub async fn resolve_target(&self) -> Result<Target, ConfigError> {
        let address = &self.game_server_address;
        let mut addrs = tokio::net::lookup_host(address.as_str())
            .await
            .map_err(|source| ConfigError::Resolve {
                address: address.clone(),
                source,
            })?;
        let addr = addrs.next().ok_or_else(|| ConfigError::NoAddress(address.clone()))?;
        Ok(Target::new(addr, self.query_timeout()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.bind(), "0.0.0.0:80");
        assert_eq!(config.game_server_address, "localhost:28785");
        assert_eq!(config.query_timeout(), Duration::from_secs(1));
        assert_eq!(config.template_path, "templates/index.html");
        assert!(!config.trust_forwarded_for);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("GAME_SERVER_ADDRESS", "sauer.example.org:10001"),
            ("QUERY_TIMEOUT_MS", "250"),
            ("TRUST_FORWARDED_FOR", "true"),
        ]);
        assert_eq!(config.bind(), "0.0.0.0:8080");
        assert_eq!(config.game_server_address, "sauer.example.org:10001");
        assert_eq!(config.query_timeout(), Duration::from_millis(250));
        assert!(config.trust_forwarded_for);
    }

    #[test]
    fn unparsable_values_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("SCOREBOARD_BURST_LIMIT", "-3")]);
        assert_eq!(config.port, 80);
        assert_eq!(config.scoreboard_burst_limit, 30);
    }

    #[test]
    fn zero_quota_is_rejected() {
        let config = config_from(&[("SCOREBOARD_BURST_LIMIT", "0")]);
        assert!(matches!(config.scoreboard_quota(), Err(ConfigError::ZeroBurst)));

        let config = config_from(&[("SCOREBOARD_PERIOD_SECS", "0")]);
        assert!(matches!(config.scoreboard_quota(), Err(ConfigError::ZeroPeriod)));

        assert!(config_from(&[]).scoreboard_quota().is_ok());
    }

    #[tokio::test]
    async fn resolves_literal_addresses() {
        let config = config_from(&[("GAME_SERVER_ADDRESS", "127.0.0.1:28785")]);
        let target = config.resolve_target().await.unwrap();
        assert_eq!(target.addr, "127.0.0.1:28785".parse::<std::net::SocketAddr>().unwrap());
        assert_eq!(target.timeout, Duration::from_secs(1));
    }
}
