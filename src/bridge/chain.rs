//! Per-chain span state
//!
//! Each driver operation gets one `SpanChain` capturing its open span. The
//! chain replaces the nested-closure shape of the hook protocol with an
//! explicit state machine: Inert (kind disabled or sink refused the span),
//! Open, Closed. Hooks arriving after Closed are no-ops that bump the
//! stray-terminal counter; hooks on an Inert chain are silent no-ops.

use opentelemetry::{Context, KeyValue};

use crate::attrs;
use crate::events::DriverError;
use crate::sink::{OpenSpan, SharedSink};

use super::{note_stray_terminal, shield};

enum State {
    /// No span was ever opened; every hook is a free no-op
    Inert,
    Open(Box<dyn OpenSpan>),
    Closed,
}

pub(crate) struct SpanChain {
    state: State,
    /// Name used for non-terminal span events on this chain
    event_name: &'static str,
}

impl SpanChain {
    /// Open a span for a new chain. A sink fault or refusal degrades to an
    /// inert chain instead of surfacing.
    pub(crate) fn open(
        sink: &SharedSink,
        parent: &Context,
        name: &'static str,
        event_name: &'static str,
        open_attrs: Vec<KeyValue>,
    ) -> SpanChain {
        let span = shield(|| sink.open(parent, name, open_attrs)).flatten();
        SpanChain {
            state: match span {
                Some(span) => State::Open(span),
                None => State::Inert,
            },
            event_name,
        }
    }

    /// Chain for a disabled kind
    pub(crate) fn inert() -> SpanChain {
        SpanChain {
            state: State::Inert,
            event_name: "",
        }
    }

    /// True while a span is held open
    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    /// Record a non-terminal event with the error flag (and message when
    /// an error is present). Never closes the span.
    pub(crate) fn annotate(&mut self, error: Option<&DriverError>) {
        match &mut self.state {
            State::Open(span) => {
                let attrs = attrs::intermediate(error);
                let name = self.event_name;
                shield(|| span.add_event(name, attrs));
            }
            State::Inert => {}
            State::Closed => note_stray_terminal(),
        }
    }

    /// Set final status from `error` and close the span with any extra
    /// attributes. A second call is a counted no-op.
    pub(crate) fn finish(&mut self, error: Option<&DriverError>, extra: Vec<KeyValue>) {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Open(mut span) => {
                let status = attrs::status_of(error);
                shield(move || span.close(status, extra));
            }
            State::Inert => {
                // Inert chains stay inert; a later hook is still not stray
                self.state = State::Inert;
            }
            State::Closed => note_stray_terminal(),
        }
    }

    /// Context carrying this chain's span, for parenting nested operations.
    /// `None` once closed or when no span exists.
    pub(crate) fn child_context(&self) -> Option<Context> {
        match &self.state {
            State::Open(span) => shield(|| span.child_context()),
            _ => None,
        }
    }
}
