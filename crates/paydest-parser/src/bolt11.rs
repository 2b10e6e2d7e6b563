//! BOLT11 invoice decoding.
//!
//! Decodes the bech32 envelope, the human readable part (currency and
//! amount), the tagged fields the wallet cares about, and recovers the payee
//! node id from the recoverable signature.

use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Fe32};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
use sha2::{Digest, Sha256};

use crate::error::InvoiceError;
use crate::network::Network;

pub const DEFAULT_EXPIRY_SECONDS: u64 = 3600;
pub const DEFAULT_MIN_FINAL_CLTV_EXPIRY: u64 = 18;

pub(crate) const TAG_PAYMENT_HASH: u8 = 1;
pub(crate) const TAG_ROUTE_HINT: u8 = 3;
pub(crate) const TAG_EXPIRY: u8 = 6;
pub(crate) const TAG_DESCRIPTION: u8 = 13;
pub(crate) const TAG_PAYMENT_SECRET: u8 = 16;
pub(crate) const TAG_PAYEE: u8 = 19;
pub(crate) const TAG_DESCRIPTION_HASH: u8 = 23;
pub(crate) const TAG_MIN_FINAL_CLTV_EXPIRY: u8 = 24;

pub(crate) const TIMESTAMP_FES: usize = 7;
pub(crate) const SIGNATURE_FES: usize = 104;
const HASH_FES: usize = 52;
const PUBKEY_FES: usize = 53;

/// Decoded BOLT11 invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bolt11Invoice {
    /// Lower-cased invoice string.
    pub encoded: String,
    pub network: Network,
    pub amount_msats: Option<u64>,
    pub timestamp: u64,
    pub payment_hash: [u8; 32],
    pub payment_secret: Option<[u8; 32]>,
    pub description: Option<String>,
    pub description_hash: Option<[u8; 32]>,
    pub payee: [u8; 33],
    pub expiry_seconds: u64,
    pub min_final_cltv_expiry: u64,
    pub route_hints: usize,
}

#[derive(Debug, Default)]
struct TaggedFields {
    payment_hash: Option<[u8; 32]>,
    payment_secret: Option<[u8; 32]>,
    description: Option<String>,
    description_hash: Option<[u8; 32]>,
    payee: Option<[u8; 33]>,
    expiry_seconds: Option<u64>,
    min_final_cltv_expiry: Option<u64>,
    route_hints: usize,
}

impl Bolt11Invoice {
    /// Decode and authenticate an invoice.
    ///
    /// The input must already be stripped of any `lightning:` prefix.
    /// All-uppercase invoices (QR alphanumeric mode) are accepted.
    pub fn decode(raw: &str) -> Result<Self, InvoiceError> {
        let encoded = normalize_case(raw.trim())?;
        let checked = CheckedHrpstring::new::<Bech32>(&encoded)
            .map_err(|error| InvoiceError::Bech32(error.to_string()))?;
        let hrp = checked.hrp().to_lowercase();
        let (network, amount_msats) = parse_hrp(&hrp)?;

        let data = checked
            .data_part_ascii_no_checksum()
            .iter()
            .map(|byte| Fe32::from_char(char::from(*byte)).map(Fe32::to_u8))
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|error| InvoiceError::Bech32(error.to_string()))?;
        if data.len() < TIMESTAMP_FES + SIGNATURE_FES {
            return Err(InvoiceError::TooShort);
        }

        let (signed, signature) = data.split_at(data.len() - SIGNATURE_FES);
        let (timestamp, fields) = signed.split_at(TIMESTAMP_FES);
        let timestamp = fes_to_u64(timestamp).ok_or(InvoiceError::TooShort)?;
        let fields = parse_tagged_fields(fields)?;
        let payment_hash = fields
            .payment_hash
            .ok_or(InvoiceError::MissingPaymentHash)?;

        let recovered = recover_payee(&hrp, signed, signature)?;
        if let Some(explicit) = fields.payee {
            if explicit != recovered {
                return Err(InvoiceError::Signature(
                    "signature does not match payee field".to_string(),
                ));
            }
        }

        Ok(Self {
            encoded,
            network,
            amount_msats,
            timestamp,
            payment_hash,
            payment_secret: fields.payment_secret,
            description: fields.description,
            description_hash: fields.description_hash,
            payee: recovered,
            expiry_seconds: fields.expiry_seconds.unwrap_or(DEFAULT_EXPIRY_SECONDS),
            min_final_cltv_expiry: fields
                .min_final_cltv_expiry
                .unwrap_or(DEFAULT_MIN_FINAL_CLTV_EXPIRY),
            route_hints: fields.route_hints,
        })
    }

    /// Cheap textual check used to pick the invoice grammar before decoding.
    #[must_use]
    pub fn looks_like_invoice(raw: &str) -> bool {
        let bytes = raw.trim().as_bytes();
        bytes.len() > 4
            && bytes[..2].eq_ignore_ascii_case(b"ln")
            && (bytes[2..4].eq_ignore_ascii_case(b"bc") || bytes[2..4].eq_ignore_ascii_case(b"tb"))
    }
}

fn normalize_case(raw: &str) -> Result<String, InvoiceError> {
    let has_lower = raw.bytes().any(|byte| byte.is_ascii_lowercase());
    let has_upper = raw.bytes().any(|byte| byte.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(InvoiceError::MixedCase);
    }
    Ok(raw.to_ascii_lowercase())
}

fn parse_hrp(hrp: &str) -> Result<(Network, Option<u64>), InvoiceError> {
    let rest = hrp
        .strip_prefix("ln")
        .ok_or_else(|| InvoiceError::Hrp(hrp.to_string()))?;
    let currency_len = rest
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (currency, amount) = rest.split_at(currency_len);
    let network = Network::from_bolt11_currency(currency)
        .ok_or_else(|| InvoiceError::Currency(currency.to_string()))?;
    Ok((network, parse_amount_msats(amount)?))
}

/// Parse the amount section of an hrp (`2500u`, `10p`, `1`) into millisatoshis.
///
/// An empty section is an amountless invoice. Unknown multipliers, `p`
/// amounts that are not a multiple of ten, and 64-bit overflow are errors.
pub fn parse_amount_msats(amount: &str) -> Result<Option<u64>, InvoiceError> {
    if amount.is_empty() {
        return Ok(None);
    }

    let digits_end = amount
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(amount.len());
    if digits_end == 0 {
        return Err(InvoiceError::Amount(amount.to_string()));
    }
    let value = amount[..digits_end]
        .parse::<u64>()
        .map_err(|error| InvoiceError::Amount(error.to_string()))?;

    let msats = match &amount[digits_end..] {
        "" => value.checked_mul(100_000_000_000),
        "m" => value.checked_mul(100_000_000),
        "u" => value.checked_mul(100_000),
        "n" => value.checked_mul(100),
        "p" => {
            if value % 10 != 0 {
                return Err(InvoiceError::Amount(format!(
                    "{amount}: sub-millisatoshi precision"
                )));
            }
            Some(value / 10)
        }
        other => {
            return Err(InvoiceError::Amount(format!("unknown multiplier {other}")));
        }
    };

    msats
        .map(Some)
        .ok_or_else(|| InvoiceError::Amount(format!("{amount}: overflow")))
}

fn parse_tagged_fields(mut fields: &[u8]) -> Result<TaggedFields, InvoiceError> {
    let mut parsed = TaggedFields::default();

    while !fields.is_empty() {
        if fields.len() < 3 {
            return Err(InvoiceError::TruncatedField);
        }
        let tag = fields[0];
        let len = usize::from(fields[1]) * 32 + usize::from(fields[2]);
        let rest = &fields[3..];
        if rest.len() < len {
            return Err(InvoiceError::TruncatedField);
        }
        let (value, remaining) = rest.split_at(len);
        fields = remaining;

        // Readers skip known fields with unexpected lengths; first occurrence wins.
        match tag {
            TAG_PAYMENT_HASH if len == HASH_FES && parsed.payment_hash.is_none() => {
                parsed.payment_hash = fes_to_array(value);
            }
            TAG_PAYMENT_SECRET if len == HASH_FES && parsed.payment_secret.is_none() => {
                parsed.payment_secret = fes_to_array(value);
            }
            TAG_DESCRIPTION_HASH if len == HASH_FES && parsed.description_hash.is_none() => {
                parsed.description_hash = fes_to_array(value);
            }
            TAG_PAYEE if len == PUBKEY_FES && parsed.payee.is_none() => {
                parsed.payee = fes_to_array(value);
            }
            TAG_DESCRIPTION if parsed.description.is_none() => {
                let bytes = fes_to_bytes(value, false);
                let text = String::from_utf8(bytes).map_err(|_| InvoiceError::Description)?;
                parsed.description = Some(text);
            }
            TAG_EXPIRY if parsed.expiry_seconds.is_none() => {
                parsed.expiry_seconds = fes_to_u64(value);
            }
            TAG_MIN_FINAL_CLTV_EXPIRY if parsed.min_final_cltv_expiry.is_none() => {
                parsed.min_final_cltv_expiry = fes_to_u64(value);
            }
            TAG_ROUTE_HINT => parsed.route_hints += 1,
            _ => {}
        }
    }

    Ok(parsed)
}

fn recover_payee(hrp: &str, signed: &[u8], signature: &[u8]) -> Result<[u8; 33], InvoiceError> {
    let signature = fes_to_bytes(signature, false);
    if signature.len() != 65 {
        return Err(InvoiceError::Signature("expected 65 bytes".to_string()));
    }
    let (compact, recovery) = signature.split_at(64);
    let recovery = recovery
        .first()
        .copied()
        .ok_or_else(|| InvoiceError::Signature("missing recovery id".to_string()))?;
    let recovery_id = RecoveryId::from_i32(i32::from(recovery))
        .map_err(|error| InvoiceError::Signature(error.to_string()))?;
    let signature = RecoverableSignature::from_compact(compact, recovery_id)
        .map_err(|error| InvoiceError::Signature(error.to_string()))?;

    let message = Message::from_digest(signing_digest(hrp, signed));
    let payee = Secp256k1::verification_only()
        .recover_ecdsa(&message, &signature)
        .map_err(|error| InvoiceError::Signature(error.to_string()))?;
    Ok(payee.serialize())
}

/// SHA-256 over the hrp bytes and the zero-padded data part that precedes the signature.
pub(crate) fn signing_digest(hrp: &str, signed: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(hrp.as_bytes());
    hasher.update(fes_to_bytes(signed, true));
    hasher.finalize().into()
}

/// Regroup 5-bit values into bytes. Trailing bits are zero-padded into a
/// final byte when `pad` is set and dropped otherwise.
pub(crate) fn fes_to_bytes(fes: &[u8], pad: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(fes.len() * 5 / 8 + 1);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for fe in fes {
        acc = (acc << 5) | u32::from(*fe & 0x1f);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
            acc &= (1 << bits) - 1;
        }
    }
    if pad && bits > 0 {
        out.push((acc << (8 - bits)) as u8);
    }
    out
}

/// Regroup bytes into 5-bit values, zero-padding the last group.
pub(crate) fn bytes_to_fes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 8 / 5 + 1);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for byte in bytes {
        acc = (acc << 8) | u32::from(*byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(((acc >> bits) & 0x1f) as u8);
        }
        acc &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(((acc << (5 - bits)) & 0x1f) as u8);
    }
    out
}

fn fes_to_u64(fes: &[u8]) -> Option<u64> {
    fes.iter().try_fold(0u64, |acc, fe| {
        acc.checked_mul(32)
            .and_then(|shifted| shifted.checked_add(u64::from(*fe)))
    })
}

fn fes_to_array<const N: usize>(fes: &[u8]) -> Option<[u8; N]> {
    let bytes = fes_to_bytes(fes, false);
    bytes.get(..N)?.try_into().ok()
}
