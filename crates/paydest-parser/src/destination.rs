use serde::{Deserialize, Serialize};

use crate::network::Network;

/// Classified payment destination. Exactly one variant per input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Destination {
    OnChainAddress(OnChainDestination),
    LightningInvoice(LightningDestination),
    LnurlPointer(LnurlPointer),
    Invalid {
        raw_input: String,
        reason: InvalidReason,
    },
}

impl Destination {
    pub(crate) fn invalid(raw_input: &str, reason: InvalidReason) -> Self {
        Self::Invalid {
            raw_input: raw_input.to_string(),
            reason,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid { .. })
    }

    /// Network embedded in the destination, when the grammar carries one.
    #[must_use]
    pub fn network(&self) -> Option<Network> {
        match self {
            Self::OnChainAddress(address) => Some(address.network),
            Self::LightningInvoice(invoice) => Some(invoice.network),
            Self::LnurlPointer(_) | Self::Invalid { .. } => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OnChainAddress(_) => "on_chain_address",
            Self::LightningInvoice(_) => "lightning_invoice",
            Self::LnurlPointer(_) => "lnurl_pointer",
            Self::Invalid { .. } => "invalid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnChainDestination {
    /// Canonical address string (bech32 lower-cased).
    pub address: String,
    pub network: Network,
    /// `p2pkh`, `p2wpkh`, ... when the script type is standard.
    pub address_type: Option<String>,
    pub amount_sats: Option<u64>,
    pub label: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightningDestination {
    /// Lower-cased invoice without any `lightning:` prefix.
    pub invoice: String,
    pub network: Network,
    pub amount_msats: Option<u64>,
    pub payment_hash: String,
    pub description: Option<String>,
    pub description_hash: Option<String>,
    /// Hex encoded compressed node id of the payee.
    pub payee: String,
    pub timestamp: u64,
    pub expiry_seconds: u64,
    /// Payee is the local node (`NetworkContext::node_pubkey`).
    pub same_node: bool,
}

impl LightningDestination {
    #[must_use]
    pub fn expires_at(&self) -> u64 {
        self.timestamp.saturating_add(self.expiry_seconds)
    }

    #[must_use]
    pub fn is_expired_at(&self, unix_seconds: u64) -> bool {
        unix_seconds >= self.expires_at()
    }
}

/// LNURL payload recognized by its textual encoding only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LnurlPointer {
    pub lnurl: String,
    pub encoding: LnurlEncoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LnurlEncoding {
    /// `lnurl1...` bech32 string.
    Bech32,
    /// LUD-17 scheme such as `lnurlp://`.
    Scheme,
    /// LUD-16 `user@domain`.
    LightningAddress,
}

/// Diagnostic detail behind an `Invalid` destination. Logged, not shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum InvalidReason {
    Empty,
    Unrecognized,
    NetworkMismatch { expected: Network, found: Network },
    MalformedInvoice(String),
    MalformedUri(String),
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use serde_json::json;

    use super::{Destination, InvalidReason, LnurlEncoding, LnurlPointer};
    use crate::network::Network;

    #[test]
    fn destination_serializes_with_kind_tag() -> Result<()> {
        let pointer = Destination::LnurlPointer(LnurlPointer {
            lnurl: "satoshi@bitcoin.org".to_string(),
            encoding: LnurlEncoding::LightningAddress,
        });
        assert_eq!(
            serde_json::to_value(&pointer)?,
            json!({
                "kind": "lnurl_pointer",
                "lnurl": "satoshi@bitcoin.org",
                "encoding": "lightning_address",
            })
        );
        assert_eq!(pointer.kind(), "lnurl_pointer");
        Ok(())
    }

    #[test]
    fn invalid_reason_serializes_as_reason_and_detail() -> Result<()> {
        let mismatch = Destination::invalid(
            "tb1qxyz",
            InvalidReason::NetworkMismatch {
                expected: Network::Mainnet,
                found: Network::Testnet,
            },
        );
        assert_eq!(
            serde_json::to_value(&mismatch)?,
            json!({
                "kind": "invalid",
                "raw_input": "tb1qxyz",
                "reason": {
                    "reason": "network_mismatch",
                    "detail": { "expected": "mainnet", "found": "testnet" },
                },
            })
        );

        assert_eq!(
            serde_json::to_value(InvalidReason::MalformedInvoice("too short".to_string()))?,
            json!({ "reason": "malformed_invoice", "detail": "too short" })
        );
        assert_eq!(
            serde_json::to_value(InvalidReason::Empty)?,
            json!({ "reason": "empty" })
        );

        let decoded: Destination = serde_json::from_value(serde_json::to_value(&mismatch)?)?;
        assert_eq!(decoded, mismatch);
        assert!(!decoded.is_valid());
        Ok(())
    }
}
