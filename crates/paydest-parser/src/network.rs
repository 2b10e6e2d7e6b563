use std::fmt;
use std::str::FromStr;

use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};

/// Bitcoin network a destination is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Signet,
    Regtest,
}

impl Network {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Signet => "signet",
            Self::Regtest => "regtest",
        }
    }

    /// BOLT11 currency prefix that follows `ln` in an invoice hrp.
    #[must_use]
    pub fn bolt11_currency(&self) -> &'static str {
        match self {
            Self::Mainnet => "bc",
            Self::Testnet => "tb",
            Self::Signet => "tbs",
            Self::Regtest => "bcrt",
        }
    }

    /// Inverse of [`Network::bolt11_currency`].
    ///
    /// Callers matching an hrp must try the longer prefixes first (`bcrt`
    /// before `bc`, `tbs` before `tb`).
    #[must_use]
    pub fn from_bolt11_currency(currency: &str) -> Option<Self> {
        match currency {
            "bc" => Some(Self::Mainnet),
            "tb" => Some(Self::Testnet),
            "tbs" => Some(Self::Signet),
            "bcrt" => Some(Self::Regtest),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_bitcoin(self) -> bitcoin::Network {
        match self {
            Self::Mainnet => bitcoin::Network::Bitcoin,
            Self::Testnet => bitcoin::Network::Testnet,
            Self::Signet => bitcoin::Network::Signet,
            Self::Regtest => bitcoin::Network::Regtest,
        }
    }

    #[must_use]
    pub fn all() -> [Self; 4] {
        [Self::Mainnet, Self::Testnet, Self::Signet, Self::Regtest]
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown network: {0}")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "signet" => Ok(Self::Signet),
            "regtest" => Ok(Self::Regtest),
            other => Err(UnknownNetwork(other.to_string())),
        }
    }
}

/// Read-only view of the wallet a classification runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkContext {
    pub network: Network,
    /// Public key of the local Lightning node, used to flag invoices that pay ourselves.
    pub node_pubkey: Option<PublicKey>,
}

impl NetworkContext {
    #[must_use]
    pub fn new(network: Network) -> Self {
        Self {
            network,
            node_pubkey: None,
        }
    }

    #[must_use]
    pub fn with_node_pubkey(mut self, node_pubkey: PublicKey) -> Self {
        self.node_pubkey = Some(node_pubkey);
        self
    }

    pub(crate) fn is_local_node(&self, payee: &[u8; 33]) -> bool {
        self.node_pubkey
            .is_some_and(|local| local.serialize() == *payee)
    }
}

#[cfg(test)]
mod tests {
    use super::{Network, UnknownNetwork};

    #[test]
    fn network_parses_case_insensitively_with_bitcoin_alias() {
        assert_eq!("MAINNET".parse::<Network>(), Ok(Network::Mainnet));
        assert_eq!(" bitcoin ".parse::<Network>(), Ok(Network::Mainnet));
        assert_eq!("Regtest".parse::<Network>(), Ok(Network::Regtest));
        assert_eq!(
            "liquid".parse::<Network>(),
            Err(UnknownNetwork("liquid".to_string()))
        );
    }

    #[test]
    fn bolt11_currency_round_trips_every_network() {
        for network in Network::all() {
            assert_eq!(
                Network::from_bolt11_currency(network.bolt11_currency()),
                Some(network)
            );
        }
        assert_eq!(Network::from_bolt11_currency("sb"), None);
    }
}
