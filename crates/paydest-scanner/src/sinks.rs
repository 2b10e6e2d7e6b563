use crate::outcome::{Outcome, Rejection};

/// Receives `ProceedWith*` outcomes and performs the screen transition.
pub trait NavigationSink: Send + Sync {
    fn navigate(&self, outcome: &Outcome);
}

/// Receives rejections for display.
pub trait AlertSink: Send + Sync {
    fn alert(&self, rejection: &Rejection);
}

/// Logs every emission; useful for headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NavigationSink for TracingSink {
    fn navigate(&self, outcome: &Outcome) {
        tracing::info!(?outcome, "navigating");
    }
}

impl AlertSink for TracingSink {
    fn alert(&self, rejection: &Rejection) {
        tracing::info!(%rejection, "alert");
    }
}
