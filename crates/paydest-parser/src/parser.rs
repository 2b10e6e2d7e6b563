use url::form_urlencoded;

use crate::address::{parse_address, parse_payment_uri, strip_bitcoin_scheme};
use crate::bolt11::Bolt11Invoice;
use crate::destination::{Destination, InvalidReason, LightningDestination};
use crate::error::UriError;
use crate::lnurl::{self, starts_with_ignore_case};
use crate::network::NetworkContext;

const LIGHTNING_SCHEME: &str = "lightning:";

/// Classify `raw_input` against the active network.
///
/// Grammars are tried in a fixed order: LNURL, BOLT11 invoice, on-chain
/// address (bare or BIP21). Total and pure: every input maps to exactly one
/// [`Destination`], and anything that carries a different network than
/// `context.network` comes back as [`Destination::Invalid`].
#[must_use]
pub fn parse(raw_input: &str, context: &NetworkContext) -> Destination {
    let destination = classify(raw_input, context);
    match &destination {
        Destination::Invalid { reason, .. } => {
            tracing::debug!(?reason, network = %context.network, "payment destination rejected");
        }
        other => {
            tracing::debug!(kind = other.kind(), network = %context.network, "payment destination parsed");
        }
    }
    destination
}

fn classify(raw_input: &str, context: &NetworkContext) -> Destination {
    let trimmed = raw_input.trim();
    if trimmed.is_empty() {
        return Destination::invalid(raw_input, InvalidReason::Empty);
    }

    let body = strip_lightning_scheme(trimmed);

    if let Some(pointer) = lnurl::detect(body) {
        return Destination::LnurlPointer(pointer);
    }

    if Bolt11Invoice::looks_like_invoice(body) {
        return match decode_invoice(body, context) {
            Ok(invoice) => Destination::LightningInvoice(invoice),
            Err(reason) => Destination::invalid(raw_input, reason),
        };
    }

    if let Some(uri) = strip_bitcoin_scheme(body) {
        return payment_uri_destination(raw_input, uri, context);
    }

    match parse_address(body, context.network) {
        Ok(address) => Destination::OnChainAddress(address),
        Err(UriError::NetworkMismatch { expected, found }) => {
            Destination::invalid(raw_input, InvalidReason::NetworkMismatch { expected, found })
        }
        Err(_) => Destination::invalid(raw_input, InvalidReason::Unrecognized),
    }
}

fn strip_lightning_scheme(raw: &str) -> &str {
    if starts_with_ignore_case(raw, LIGHTNING_SCHEME) {
        let rest = &raw[LIGHTNING_SCHEME.len()..];
        rest.strip_prefix("//").unwrap_or(rest).trim()
    } else {
        raw
    }
}

fn decode_invoice(
    encoded: &str,
    context: &NetworkContext,
) -> Result<LightningDestination, InvalidReason> {
    let invoice = Bolt11Invoice::decode(encoded)
        .map_err(|error| InvalidReason::MalformedInvoice(error.to_string()))?;
    if invoice.network != context.network {
        return Err(InvalidReason::NetworkMismatch {
            expected: context.network,
            found: invoice.network,
        });
    }

    Ok(LightningDestination {
        same_node: context.is_local_node(&invoice.payee),
        payee: hex::encode(invoice.payee),
        payment_hash: hex::encode(invoice.payment_hash),
        description_hash: invoice.description_hash.map(hex::encode),
        description: invoice.description,
        amount_msats: invoice.amount_msats,
        network: invoice.network,
        timestamp: invoice.timestamp,
        expiry_seconds: invoice.expiry_seconds,
        invoice: invoice.encoded,
    })
}

// BIP21, including unified QRs that carry a BOLT11 fallback in `lightning=`.
fn payment_uri_destination(raw_input: &str, body: &str, context: &NetworkContext) -> Destination {
    if let Some(query) = body.strip_prefix('?') {
        let lightning = form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key.eq_ignore_ascii_case("lightning"))
            .map(|(_, value)| value.into_owned());
        return match lightning {
            Some(invoice) => match decode_invoice(strip_lightning_scheme(&invoice), context) {
                Ok(invoice) => Destination::LightningInvoice(invoice),
                Err(reason) => Destination::invalid(raw_input, reason),
            },
            None => Destination::invalid(
                raw_input,
                InvalidReason::MalformedUri("missing address".to_string()),
            ),
        };
    }

    match parse_payment_uri(body, context.network) {
        Ok(uri) => {
            if let Some(invoice) = uri.lightning.as_deref() {
                match decode_invoice(strip_lightning_scheme(invoice), context) {
                    Ok(invoice) => return Destination::LightningInvoice(invoice),
                    Err(reason) => {
                        tracing::debug!(?reason, "ignoring unusable lightning parameter");
                    }
                }
            }
            Destination::OnChainAddress(uri.address)
        }
        Err(UriError::NetworkMismatch { expected, found }) => {
            Destination::invalid(raw_input, InvalidReason::NetworkMismatch { expected, found })
        }
        Err(error) => Destination::invalid(raw_input, InvalidReason::MalformedUri(error.to_string())),
    }
}
