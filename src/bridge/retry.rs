//! Retry loop bridge
//!
//! One span covers the whole retry loop. The caller's idempotency
//! declaration is recorded at open; each finished attempt becomes a span
//! event; the final attempt count lands as an attribute at close. The bridge
//! only observes the loop - retry policy stays in the driver.

use opentelemetry::Context;

use crate::attrs;
use crate::details::Details;
use crate::events::{RetryDone, RetryIntermediate, RetryStart};
use crate::sink::SharedSink;

use super::chain::SpanChain;

/// Build the retry bridge. When the mask excludes retry events, the
/// returned tracer hands out inert chains and never touches the sink.
pub fn retry(details: Details, sink: &SharedSink) -> RetryTracer {
    RetryTracer {
        sink: details
            .contains(Details::RETRY)
            .then(|| SharedSink::clone(sink)),
    }
}

/// Start hook for the retry loop, wired once at driver setup
pub struct RetryTracer {
    sink: Option<SharedSink>,
}

impl RetryTracer {
    /// A retry loop begins
    pub fn on_retry(&self, info: RetryStart<'_>) -> RetryChain {
        let chain = match &self.sink {
            Some(sink) => SpanChain::open(
                sink,
                info.context,
                "db.retry",
                "retry.attempt",
                vec![attrs::idempotent(info.idempotent)],
            ),
            None => SpanChain::inert(),
        };
        RetryChain { chain }
    }
}

/// Streaming-shaped chain: one event per finished attempt, closed by the
/// loop's done record
pub struct RetryChain {
    chain: SpanChain,
}

impl RetryChain {
    /// One attempt finished; annotates without closing
    pub fn on_intermediate(&mut self, info: RetryIntermediate<'_>) {
        self.chain.annotate(info.error);
    }

    /// Loop finished; records the attempt count and closes the span
    pub fn on_done(&mut self, info: RetryDone<'_>) {
        self.chain
            .finish(info.error, vec![attrs::attempts(info.attempts)]);
    }

    /// Context for parenting the operations the loop runs, so each inner
    /// execution shows up as a child of the retry span
    pub fn context(&self) -> Option<Context> {
        self.chain.child_context()
    }
}
