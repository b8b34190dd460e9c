//! Per-call context.
//!
//! A [`Context`] travels from the caller through every middleware into the
//! operation. Middlewares derive modified copies (trace id, deadline) and pass
//! them on; the caller's copy is never mutated.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Values carried alongside a single pooled call.
#[derive(Debug, Clone, Default)]
pub struct Context {
    trace_id: Option<String>,
    method: Option<String>,
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl Context {
    /// Create an empty context with a fresh cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a trace identifier.
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Attach a method label (used by the metrics middleware).
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Set an absolute deadline. An earlier existing deadline wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Set a deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Replace the cancellation token, e.g. to tie the call to a shutdown signal.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Derive a bounded child: the deadline is tightened and the child gets its
    /// own token, which is cancelled with the parent but not the other way round.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            method: self.method.clone(),
            deadline: self.deadline,
            cancel: self.cancel.child_token(),
        }
        .with_timeout(timeout)
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if one is set. Zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the context is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}
