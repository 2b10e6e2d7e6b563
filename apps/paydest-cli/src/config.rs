use std::env;
use std::time::Duration;

use paydest_lnurl::ResolverConfig;
use paydest_parser::{Network, NetworkContext, PublicKey};
use thiserror::Error;

const DEFAULT_LNURL_TIMEOUT_MS: u64 = 10_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub network: Network,
    pub node_pubkey: Option<PublicKey>,
    pub lnurl_timeout_ms: u64,
    pub lnurl_allow_http: bool,
    pub user_agent: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid PAYDEST_NETWORK: {0}")]
    InvalidNetwork(String),
    #[error("invalid PAYDEST_NODE_PUBKEY: {0}")]
    InvalidNodePubkey(String),
    #[error("invalid PAYDEST_LNURL_TIMEOUT_MS: {0}")]
    InvalidLnurlTimeoutMs(String),
    #[error("invalid PAYDEST_LNURL_ALLOW_HTTP: {0}")]
    InvalidLnurlAllowHttp(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network = lookup("PAYDEST_NETWORK")
            .unwrap_or_else(|| "mainnet".to_string())
            .parse::<Network>()
            .map_err(|error| ConfigError::InvalidNetwork(error.to_string()))?;
        let node_pubkey = lookup("PAYDEST_NODE_PUBKEY")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|value| value.parse::<PublicKey>())
            .transpose()
            .map_err(|error| ConfigError::InvalidNodePubkey(error.to_string()))?;
        let lnurl_timeout_ms = lookup("PAYDEST_LNURL_TIMEOUT_MS")
            .unwrap_or_else(|| DEFAULT_LNURL_TIMEOUT_MS.to_string())
            .trim()
            .parse::<u64>()
            .map_err(|error| ConfigError::InvalidLnurlTimeoutMs(error.to_string()))?;
        if lnurl_timeout_ms == 0 {
            return Err(ConfigError::InvalidLnurlTimeoutMs(
                "must be greater than zero".to_string(),
            ));
        }
        let lnurl_allow_http = parse_bool(lookup("PAYDEST_LNURL_ALLOW_HTTP"), false)
            .map_err(ConfigError::InvalidLnurlAllowHttp)?;
        let user_agent = lookup("PAYDEST_USER_AGENT")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| format!("paydest/{}", env!("CARGO_PKG_VERSION")));

        Ok(Self {
            network,
            node_pubkey,
            lnurl_timeout_ms,
            lnurl_allow_http,
            user_agent,
        })
    }

    #[must_use]
    pub fn network_context(&self) -> NetworkContext {
        let context = NetworkContext::new(self.network);
        match self.node_pubkey {
            Some(node_pubkey) => context.with_node_pubkey(node_pubkey),
            None => context,
        }
    }

    #[must_use]
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            timeout: Duration::from_millis(self.lnurl_timeout_ms),
            allow_insecure_http: self.lnurl_allow_http,
            user_agent: self.user_agent.clone(),
        }
    }
}

fn parse_bool(raw: Option<String>, default: bool) -> Result<bool, String> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use anyhow::Result;
    use paydest_parser::Network;

    use super::{Config, ConfigError};

    const NODE_PUBKEY: &str = "03e7156ae33b0a208d0744199163177e909e80176e55d97a2f221ede0f934dd9ad";

    fn config_from(values: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let values: HashMap<&str, &str> = values.iter().copied().collect();
        Config::from_lookup(|key| values.get(key).map(ToString::to_string))
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() -> Result<()> {
        let config = config_from(&[])?;
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.node_pubkey, None);
        assert_eq!(config.lnurl_timeout_ms, 10_000);
        assert!(!config.lnurl_allow_http);
        assert!(config.user_agent.starts_with("paydest/"));

        let resolver = config.resolver_config();
        assert_eq!(resolver.timeout, Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn env_overrides_are_applied() -> Result<()> {
        let config = config_from(&[
            ("PAYDEST_NETWORK", "signet"),
            ("PAYDEST_NODE_PUBKEY", NODE_PUBKEY),
            ("PAYDEST_LNURL_TIMEOUT_MS", "2500"),
            ("PAYDEST_LNURL_ALLOW_HTTP", "yes"),
            ("PAYDEST_USER_AGENT", "wallet/2.0"),
        ])?;
        assert_eq!(config.network, Network::Signet);
        assert_eq!(
            config.node_pubkey.map(|key| key.to_string()),
            Some(NODE_PUBKEY.to_string())
        );
        assert!(config.lnurl_allow_http);

        let context = config.network_context();
        assert_eq!(context.network, Network::Signet);
        assert!(context.node_pubkey.is_some());

        let resolver = config.resolver_config();
        assert_eq!(resolver.timeout, Duration::from_millis(2500));
        assert!(resolver.allow_insecure_http);
        assert_eq!(resolver.user_agent, "wallet/2.0");
        Ok(())
    }

    #[test]
    fn malformed_values_name_the_variable() {
        assert!(matches!(
            config_from(&[("PAYDEST_NETWORK", "liquid")]),
            Err(ConfigError::InvalidNetwork(_))
        ));
        assert!(matches!(
            config_from(&[("PAYDEST_NODE_PUBKEY", "02abc")]),
            Err(ConfigError::InvalidNodePubkey(_))
        ));
        assert!(matches!(
            config_from(&[("PAYDEST_LNURL_TIMEOUT_MS", "soon")]),
            Err(ConfigError::InvalidLnurlTimeoutMs(_))
        ));
        assert!(matches!(
            config_from(&[("PAYDEST_LNURL_TIMEOUT_MS", "0")]),
            Err(ConfigError::InvalidLnurlTimeoutMs(_))
        ));
        assert_eq!(
            config_from(&[("PAYDEST_LNURL_ALLOW_HTTP", "maybe")]),
            Err(ConfigError::InvalidLnurlAllowHttp("maybe".to_string()))
        );
    }
}
