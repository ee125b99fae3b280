//! OpenTelemetry Span Sink
//!
//! Wraps an explicitly passed tracer. Spans open as children of whatever
//! span is active in the caller's context, so a retry loop wrapping a
//! scripting execute shows up as parent/child in the backend.

use opentelemetry::global::BoxedTracer;
use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};

use super::{OpenSpan, SpanSink};

/// Span sink backed by an OpenTelemetry tracer
pub struct OtelSink {
    tracer: BoxedTracer,
}

impl OtelSink {
    /// Wrap a tracer obtained from the installed provider, e.g.
    /// `opentelemetry::global::tracer("dbtrace")`
    pub fn new(tracer: BoxedTracer) -> Self {
        OtelSink { tracer }
    }
}

impl SpanSink for OtelSink {
    fn open(
        &self,
        parent: &Context,
        name: &'static str,
        attrs: Vec<KeyValue>,
    ) -> Option<Box<dyn OpenSpan>> {
        let builder = self
            .tracer
            .span_builder(name)
            .with_kind(SpanKind::Client)
            .with_attributes(attrs);
        let span = self.tracer.build_with_context(builder, parent);
        Some(Box::new(OtelSpan {
            context: parent.with_span(span),
        }))
    }
}

/// Open span stored inside its own context so annotate/close and child
/// parenting all go through the same handle
struct OtelSpan {
    context: Context,
}

impl OpenSpan for OtelSpan {
    fn add_event(&mut self, name: &'static str, attrs: Vec<KeyValue>) {
        self.context.span().add_event(name, attrs);
    }

    fn close(&mut self, status: Status, attrs: Vec<KeyValue>) {
        let span = self.context.span();
        for attr in attrs {
            span.set_attribute(attr);
        }
        span.set_status(status);
        span.end();
    }

    fn child_context(&self) -> Context {
        self.context.clone()
    }
}
