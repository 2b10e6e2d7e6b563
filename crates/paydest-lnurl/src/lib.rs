//! LNURL resolution.
//!
//! Takes the textual [`paydest_parser::LnurlPointer`] produced by the parser,
//! fetches the service response once and classifies it. Only `payRequest`
//! is supported; every other tag is reported back as unsupported.

mod error;
mod pointer;
mod resolver;
mod response;

pub use error::LnurlError;
pub use pointer::{PointerTarget, encode_lnurl, pointer_target};
pub use resolver::{DEFAULT_TIMEOUT, HttpLnurlResolver, LnurlResolver, MAX_BODY_BYTES, ResolverConfig};
pub use response::{FailureCategory, FailureReason, LnurlResolution, PayRequestParams};
