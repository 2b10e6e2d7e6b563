use std::fmt;

use paydest_lnurl::PayRequestParams;
use paydest_parser::{LightningDestination, LnurlPointer, OnChainDestination};
use serde::Serialize;

/// Final decision for one user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    ProceedWithPayment {
        payload: PaymentPayload,
    },
    ProceedWithPayRequest {
        payload: PayRequestPayload,
    },
    RejectedUnsupported {
        tag: String,
    },
    RejectedInvalid {
        raw_input: String,
        /// Only ever a reason supplied by the remote LNURL service.
        reason: Option<String>,
    },
    /// A classification is already in flight; this frame was dropped.
    Pending,
}

impl Outcome {
    #[must_use]
    pub fn is_navigable(&self) -> bool {
        matches!(
            self,
            Self::ProceedWithPayment { .. } | Self::ProceedWithPayRequest { .. }
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::RejectedUnsupported { tag } => Some(Rejection::UnsupportedLnurl { found: tag.clone() }),
            Self::RejectedInvalid {
                reason: Some(reason),
                ..
            } => Some(Rejection::Remote {
                reason: reason.clone(),
            }),
            Self::RejectedInvalid { raw_input, .. } => Some(Rejection::InvalidDestination {
                found: raw_input.clone(),
            }),
            Self::ProceedWithPayment { .. } | Self::ProceedWithPayRequest { .. } | Self::Pending => {
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentPayload {
    OnChain(OnChainDestination),
    Lightning(LightningDestination),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayRequestPayload {
    pub pointer: LnurlPointer,
    pub params: PayRequestParams,
}

/// What the alert sink is asked to show. `Display` is a fallback English
/// message; hosts are expected to localize from the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    InvalidDestination { found: String },
    UnsupportedLnurl { found: String },
    Remote { reason: String },
    NoCodeFound,
    EmptyClipboard,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDestination { found } => {
                write!(f, "We found:\n\n{found}\n\nThis is not a valid payment destination for this wallet")
            }
            Self::UnsupportedLnurl { found } => {
                write!(f, "This LNURL is a {found}, which is not supported")
            }
            Self::Remote { reason } => f.write_str(reason),
            Self::NoCodeFound => f.write_str("No QR code found in the image"),
            Self::EmptyClipboard => f.write_str("The clipboard is empty"),
        }
    }
}
