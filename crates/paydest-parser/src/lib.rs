//! Payment destination parsing.
//!
//! Turns an arbitrary scanned, pasted or image-decoded string into a
//! [`Destination`]:
//! - LNURL pointers (`lnurl1...`, LUD-17 schemes, LUD-01 fallback URLs,
//!   Lightning Addresses), recognized textually and resolved elsewhere
//! - BOLT11 invoices, fully decoded and signature-checked
//! - on-chain addresses, bare or inside BIP21 `bitcoin:` URIs
//!
//! Network contract: a destination whose embedded network differs from
//! [`NetworkContext::network`] is always [`Destination::Invalid`].

mod address;
mod bolt11;
mod destination;
mod error;
mod lnurl;
mod network;
mod parser;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use address::{PaymentUri, parse_address, parse_payment_uri};
pub use bolt11::{Bolt11Invoice, DEFAULT_EXPIRY_SECONDS, DEFAULT_MIN_FINAL_CLTV_EXPIRY, parse_amount_msats};
pub use destination::{
    Destination, InvalidReason, LightningDestination, LnurlEncoding, LnurlPointer,
    OnChainDestination,
};
pub use error::{InvoiceError, UriError};
pub use network::{Network, NetworkContext, UnknownNetwork};
pub use parser::parse;
pub use secp256k1::PublicKey;
