use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures::{FutureExt, Stream, StreamExt};
use paydest_lnurl::{LnurlResolution, LnurlResolver};
use paydest_parser::{Destination, LnurlPointer, NetworkContext, parse};
use tokio_util::sync::CancellationToken;

use crate::guard::{GuardPermit, Phase, ScanGuard};
use crate::inputs::{ClipboardReader, ImageDecoder, InputError};
use crate::outcome::{Outcome, PayRequestPayload, PaymentPayload, Rejection};
use crate::sinks::{AlertSink, NavigationSink};
use crate::source::RawInput;

/// Sequences parse, optional LNURL resolution and emission for each user
/// action. One orchestrator lives as long as its hosting screen.
pub struct DecisionOrchestrator {
    context: NetworkContext,
    resolver: Arc<dyn LnurlResolver>,
    navigation: Arc<dyn NavigationSink>,
    alerts: Arc<dyn AlertSink>,
    guard: ScanGuard,
    shutdown: CancellationToken,
}

impl DecisionOrchestrator {
    pub fn new(
        context: NetworkContext,
        resolver: Arc<dyn LnurlResolver>,
        navigation: Arc<dyn NavigationSink>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            context,
            resolver,
            navigation,
            alerts,
            guard: ScanGuard::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Tie teardown to an externally owned token, e.g. the host screen's.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    #[must_use]
    pub fn context(&self) -> &NetworkContext {
        &self.context
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.guard.phase()
    }

    /// Cancel in-flight work. Nothing is emitted after this returns.
    pub fn teardown(&self) {
        tracing::debug!("scanner torn down");
        self.shutdown.cancel();
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Classify one input and emit its outcome.
    ///
    /// Returns `Some(Outcome::Pending)` for a camera frame dropped because
    /// another action holds the guard, `Some(outcome)` once an outcome has
    /// been emitted, and `None` after teardown or when the action aborted.
    pub async fn classify(&self, input: RawInput) -> Option<Outcome> {
        if self.is_torn_down() {
            return None;
        }

        let permit = match self.guard.try_acquire() {
            Some(permit) => Some(permit),
            None if input.source.is_continuous() => {
                tracing::trace!(phase = ?self.guard.phase(), "dropping frame while classification is in flight");
                return Some(Outcome::Pending);
            }
            None => None,
        };

        let decided = AssertUnwindSafe(self.decide(&input, permit.as_ref()))
            .catch_unwind()
            .await;
        let outcome = match decided {
            Ok(Some(outcome)) => outcome,
            Ok(None) => return None,
            Err(_) => {
                tracing::error!(source = %input.source, "classification aborted by an internal defect");
                return None;
            }
        };

        if self.is_torn_down() {
            tracing::debug!("discarding outcome produced after teardown");
            return None;
        }
        self.emit(&outcome);
        drop(permit);
        Some(outcome)
    }

    /// Read the clipboard and classify its text as a discrete action.
    pub async fn paste(&self, clipboard: &dyn ClipboardReader) -> Result<Option<Outcome>, InputError> {
        if self.is_torn_down() {
            return Ok(None);
        }
        let text = clipboard
            .read_text()
            .await?
            .filter(|text| !text.trim().is_empty());
        let Some(text) = text else {
            self.reject_input(Rejection::EmptyClipboard);
            return Err(InputError::EmptyClipboard);
        };
        Ok(self.classify(RawInput::clipboard(text)).await)
    }

    /// Decode a picked image and classify the code it contains.
    pub async fn import_image(
        &self,
        decoder: &dyn ImageDecoder,
        image: &Path,
    ) -> Result<Option<Outcome>, InputError> {
        if self.is_torn_down() {
            return Ok(None);
        }
        let Some(text) = decoder.decode(image).await? else {
            self.reject_input(Rejection::NoCodeFound);
            return Err(InputError::NoCodeFound);
        };
        Ok(self.classify(RawInput::image(text)).await)
    }

    /// Feed a camera stream through the guard until something navigable is
    /// found. Frames arriving while a classification is in flight are drained
    /// and dropped. Returns `None` on teardown or when the stream ends.
    pub async fn scan_frames<S>(&self, frames: S) -> Option<Outcome>
    where
        S: Stream<Item = String>,
    {
        let mut frames = std::pin::pin!(frames.fuse());
        loop {
            let frame = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return None,
                frame = frames.next() => frame?,
            };

            // The in-flight branch is polled first so it holds the guard
            // before any further frame is pulled.
            let in_flight = self.classify(RawInput::camera(frame));
            tokio::pin!(in_flight);
            let outcome = loop {
                tokio::select! {
                    biased;
                    outcome = &mut in_flight => break outcome,
                    Some(_) = frames.next() => {
                        tracing::trace!(phase = ?self.guard.phase(), "dropping frame while classification is in flight");
                    }
                }
            };

            match outcome {
                Some(outcome) if outcome.is_navigable() => return Some(outcome),
                _ if self.is_torn_down() => return None,
                _ => {}
            }
        }
    }

    async fn decide(&self, input: &RawInput, permit: Option<&GuardPermit<'_>>) -> Option<Outcome> {
        let destination = parse(&input.text, &self.context);
        tracing::debug!(source = %input.source, kind = destination.kind(), "parsed input");

        match destination {
            Destination::Invalid { raw_input, reason } => {
                tracing::info!(source = %input.source, ?reason, "rejecting invalid destination");
                Some(Outcome::RejectedInvalid {
                    raw_input,
                    reason: None,
                })
            }
            Destination::OnChainAddress(address) => Some(Outcome::ProceedWithPayment {
                payload: PaymentPayload::OnChain(address),
            }),
            Destination::LightningInvoice(invoice) => Some(Outcome::ProceedWithPayment {
                payload: PaymentPayload::Lightning(invoice),
            }),
            Destination::LnurlPointer(pointer) => {
                if let Some(permit) = permit {
                    permit.enter_resolving();
                }
                let resolution = tokio::select! {
                    biased;
                    () = self.shutdown.cancelled() => {
                        tracing::debug!("lnurl resolution cancelled by teardown");
                        return None;
                    }
                    resolution = self.resolver.resolve(&pointer) => resolution,
                };
                Some(resolution_outcome(&input.text, pointer, resolution))
            }
        }
    }

    fn emit(&self, outcome: &Outcome) {
        if outcome.is_navigable() {
            self.navigation.navigate(outcome);
        } else if let Some(rejection) = outcome.rejection() {
            self.alerts.alert(&rejection);
        }
    }

    fn reject_input(&self, rejection: Rejection) {
        if !self.is_torn_down() {
            self.alerts.alert(&rejection);
        }
    }
}

fn resolution_outcome(raw_input: &str, pointer: LnurlPointer, resolution: LnurlResolution) -> Outcome {
    match resolution {
        LnurlResolution::PayRequest { params } => Outcome::ProceedWithPayRequest {
            payload: PayRequestPayload { pointer, params },
        },
        LnurlResolution::UnsupportedRequest { tag } => Outcome::RejectedUnsupported { tag },
        LnurlResolution::ResolutionFailure { reason } => {
            tracing::warn!(
                category = reason.category().as_str(),
                reason = %reason,
                "rejecting lnurl that could not be resolved"
            );
            Outcome::RejectedInvalid {
                raw_input: raw_input.to_string(),
                reason: reason.remote_reason().map(str::to_string),
            }
        }
    }
}
