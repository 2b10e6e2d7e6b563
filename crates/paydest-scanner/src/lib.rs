//! Scan-to-pay decision flow.
//!
//! [`DecisionOrchestrator`] runs parse, then LNURL resolution when needed,
//! and emits exactly one [`Outcome`] per user action to a navigation or
//! alert sink. Camera frames go through a re-entrancy guard so a code held
//! in front of the lens triggers one navigation; pastes and image imports
//! are discrete and bypass a held guard. Teardown cancels in-flight work
//! and suppresses emission.

mod guard;
mod inputs;
mod orchestrator;
mod outcome;
mod sinks;
mod source;

pub use guard::{GuardPermit, Phase, ScanGuard};
pub use inputs::{ClipboardReader, ImageDecoder, InputError};
pub use orchestrator::DecisionOrchestrator;
pub use outcome::{Outcome, PayRequestPayload, PaymentPayload, Rejection};
pub use sinks::{AlertSink, NavigationSink, TracingSink};
pub use source::{RawInput, ScanSource, UnknownSource};
pub use tokio_util::sync::CancellationToken;
