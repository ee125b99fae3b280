//! Scripting operation bridge
//!
//! Covers the four scripting hooks: one-shot execute, streaming execute,
//! explain and close. Execute/explain/close are simple two-stage chains
//! (start then done); streaming execute inserts any number of intermediate
//! batch events between the two.

use opentelemetry::Context;

use crate::attrs;
use crate::details::Details;
use crate::events::{
    CloseDone, CloseStart, ExecuteDone, ExecuteStart, ExplainDone, ExplainStart,
    StreamExecuteDone, StreamExecuteIntermediate, StreamExecuteStart,
};
use crate::sink::SharedSink;

use super::chain::SpanChain;
use super::shield;

/// Build the scripting bridge. When the mask excludes scripting, the
/// returned tracer hands out inert chains and never touches the sink.
pub fn scripting(details: Details, sink: &SharedSink) -> ScriptingTracer {
    ScriptingTracer {
        sink: details
            .contains(Details::SCRIPTING)
            .then(|| SharedSink::clone(sink)),
    }
}

/// Start hooks for scripting operations, wired once at driver setup
pub struct ScriptingTracer {
    sink: Option<SharedSink>,
}

impl ScriptingTracer {
    /// One-shot execution begins; returns the chain the driver drives to done
    pub fn on_execute(&self, info: ExecuteStart<'_>) -> ExecuteChain {
        let chain = match &self.sink {
            Some(sink) => {
                let mut open_attrs = vec![attrs::query(info.query)];
                if let Some(params) = info.parameters {
                    open_attrs.push(attrs::parameters(params));
                }
                SpanChain::open(sink, info.context, "db.scripting.execute", "", open_attrs)
            }
            None => SpanChain::inert(),
        };
        ExecuteChain { chain }
    }

    /// Streaming execution begins
    pub fn on_stream_execute(&self, info: StreamExecuteStart<'_>) -> StreamExecuteChain {
        let chain = match &self.sink {
            Some(sink) => {
                let mut open_attrs = vec![attrs::query(info.query)];
                if let Some(params) = info.parameters {
                    open_attrs.push(attrs::parameters(params));
                }
                SpanChain::open(
                    sink,
                    info.context,
                    "db.scripting.stream_execute",
                    "stream.next",
                    open_attrs,
                )
            }
            None => SpanChain::inert(),
        };
        StreamExecuteChain { chain }
    }

    /// Plan request begins
    pub fn on_explain(&self, info: ExplainStart<'_>) -> ExplainChain {
        let chain = match &self.sink {
            Some(sink) => SpanChain::open(
                sink,
                info.context,
                "db.scripting.explain",
                "",
                vec![attrs::query(info.query)],
            ),
            None => SpanChain::inert(),
        };
        ExplainChain { chain }
    }

    /// Client shutdown begins
    pub fn on_close(&self, info: CloseStart<'_>) -> CloseChain {
        let chain = match &self.sink {
            Some(sink) => {
                SpanChain::open(sink, info.context, "db.scripting.close", "", Vec::new())
            }
            None => SpanChain::inert(),
        };
        CloseChain { chain }
    }
}

/// Two-stage chain for one-shot execution
pub struct ExecuteChain {
    chain: SpanChain,
}

impl ExecuteChain {
    /// Finalize: status from the operation error, falling back to the error
    /// carried inside the result value when the operation itself succeeded
    pub fn on_done(&mut self, info: ExecuteDone<'_>) {
        let result_err = match info.error {
            Some(_) => None,
            None => info
                .result
                .and_then(|result| shield(|| result.err()).flatten()),
        };
        self.chain.finish(info.error.or(result_err), Vec::new());
    }

    /// Context for parenting operations nested under this one
    pub fn context(&self) -> Option<Context> {
        self.chain.child_context()
    }
}

/// Two-stage chain for a plan request
pub struct ExplainChain {
    chain: SpanChain,
}

impl ExplainChain {
    pub fn on_done(&mut self, info: ExplainDone<'_>) {
        self.chain.finish(info.error, Vec::new());
    }
}

/// Two-stage chain for client shutdown
pub struct CloseChain {
    chain: SpanChain,
}

impl CloseChain {
    pub fn on_done(&mut self, info: CloseDone<'_>) {
        self.chain.finish(info.error, Vec::new());
    }
}

/// Streaming chain: intermediates annotate, the done record closes
pub struct StreamExecuteChain {
    chain: SpanChain,
}

impl StreamExecuteChain {
    /// One streamed batch arrived; annotates without closing
    pub fn on_intermediate(&mut self, info: StreamExecuteIntermediate<'_>) {
        self.chain.annotate(info.error);
    }

    /// Stream finished; closes the span
    pub fn on_done(&mut self, info: StreamExecuteDone<'_>) {
        self.chain.finish(info.error, Vec::new());
    }

    /// Context for parenting operations nested under this one
    pub fn context(&self) -> Option<Context> {
        self.chain.child_context()
    }
}
