//! On-chain addresses and BIP21 `bitcoin:` URIs.

use bitcoin::address::NetworkUnchecked;
use bitcoin::amount::Denomination;
use bitcoin::{Address, Amount};
use url::form_urlencoded;

use crate::destination::OnChainDestination;
use crate::error::UriError;
use crate::network::Network;

const BITCOIN_SCHEME: &str = "bitcoin:";

/// Parsed BIP21 URI before the lightning fallback is considered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUri {
    pub address: OnChainDestination,
    /// Raw `lightning=` parameter, if any.
    pub lightning: Option<String>,
}

pub(crate) fn strip_bitcoin_scheme(raw: &str) -> Option<&str> {
    let prefix = raw.get(..BITCOIN_SCHEME.len())?;
    if prefix.eq_ignore_ascii_case(BITCOIN_SCHEME) {
        raw.get(BITCOIN_SCHEME.len()..)
    } else {
        None
    }
}

/// Validate a bare address for `network`.
pub fn parse_address(raw: &str, network: Network) -> Result<OnChainDestination, UriError> {
    let candidate = normalize_bech32_case(raw.trim());
    let unchecked = candidate
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|error| UriError::Address(error.to_string()))?;

    if !unchecked.is_valid_for_network(network.to_bitcoin()) {
        let found = Network::all()
            .into_iter()
            .find(|candidate| unchecked.is_valid_for_network(candidate.to_bitcoin()))
            .ok_or_else(|| UriError::Address(candidate.clone()))?;
        return Err(UriError::NetworkMismatch {
            expected: network,
            found,
        });
    }

    let address = unchecked.assume_checked();
    Ok(OnChainDestination {
        address: address.to_string(),
        network,
        address_type: address.address_type().map(|kind| kind.to_string()),
        amount_sats: None,
        label: None,
        message: None,
    })
}

/// Parse the part after `bitcoin:`.
pub fn parse_payment_uri(body: &str, network: Network) -> Result<PaymentUri, UriError> {
    let (address, query) = body.split_once('?').unwrap_or((body, ""));
    let mut destination = parse_address(address, network)?;
    let mut lightning = None;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.to_ascii_lowercase().as_str() {
            "amount" => {
                let amount = Amount::from_str_in(&value, Denomination::Bitcoin)
                    .map_err(|error| UriError::Amount(format!("{value}: {error}")))?;
                destination.amount_sats = Some(amount.to_sat());
            }
            "label" => destination.label = Some(value.into_owned()),
            "message" => destination.message = Some(value.into_owned()),
            "lightning" => lightning = Some(value.into_owned()),
            other if other.starts_with("req-") => {
                return Err(UriError::RequiredParameter(other.to_string()));
            }
            _ => {}
        }
    }

    Ok(PaymentUri {
        address: destination,
        lightning,
    })
}

// Bech32 is case-insensitive but QR codes often carry upper-case; base58 is not.
fn normalize_bech32_case(raw: &str) -> String {
    let lowered = raw.to_ascii_lowercase();
    let is_bech32 = ["bc1", "tb1", "bcrt1"]
        .iter()
        .any(|prefix| lowered.starts_with(prefix));
    if is_bech32 && !raw.bytes().any(|byte| byte.is_ascii_lowercase()) {
        lowered
    } else {
        raw.to_string()
    }
}
