//! Span Lifecycle Bridge
//!
//! Turns the driver's start / intermediate / done trace hooks into span
//! opens, annotations and closes. One constructor per operation family,
//! wired once at driver setup:
//!
//! ```rust,ignore
//! use dbtrace_otel::{bridge, Details};
//! use dbtrace_otel::sink::{OtelSink, SharedSink};
//! use std::sync::Arc;
//!
//! let sink: SharedSink = Arc::new(OtelSink::new(opentelemetry::global::tracer("dbtrace")));
//! let scripting = bridge::scripting(Details::ALL, &sink);
//! let retry = bridge::retry(Details::ALL, &sink);
//! ```
//!
//! The bridge is a pure observer. It runs on the caller's thread, owns no
//! tasks or timeouts, and swallows every internal fault so instrumentation
//! can never change what the traced operation returns. A chain abandoned
//! before its done hook leaks its span; that limitation is accepted rather
//! than patched with a watchdog.

mod chain;
mod retry;
mod scripting;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

pub use retry::{retry, RetryChain, RetryTracer};
pub use scripting::{
    scripting, CloseChain, ExecuteChain, ExplainChain, ScriptingTracer, StreamExecuteChain,
};

static SWALLOWED_FAULTS: AtomicU64 = AtomicU64::new(0);
static STRAY_TERMINALS: AtomicU64 = AtomicU64::new(0);

/// Counters for faults the bridge absorbed silently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    /// Internal panics caught and dropped (formatting, sink calls)
    pub swallowed_faults: u64,
    /// Terminal or intermediate hooks invoked after the chain closed
    pub stray_terminals: u64,
}

/// Snapshot of the bridge's diagnostic counters
pub fn diagnostics() -> Diagnostics {
    Diagnostics {
        swallowed_faults: SWALLOWED_FAULTS.load(Ordering::Relaxed),
        stray_terminals: STRAY_TERMINALS.load(Ordering::Relaxed),
    }
}

pub(crate) fn note_stray_terminal() {
    STRAY_TERMINALS.fetch_add(1, Ordering::Relaxed);
    tracing::debug!("trace hook invoked after chain closed; ignoring");
}

/// Run an instrumentation-internal call, absorbing any panic. Returns `None`
/// when the call faulted; callers drop the span work for that call and the
/// traced operation proceeds untouched.
pub(crate) fn shield<T>(f: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(_) => {
            SWALLOWED_FAULTS.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("instrumentation fault swallowed");
            None
        }
    }
}
