//! Span Sink Trait for Test Compatibility
//!
//! Trait abstraction over the external tracer that supports:
//! - Production: OpenTelemetry tracer (see `otel`)
//! - Tests: in-memory recording for verification
//!
//! The sink is an explicitly constructed instance passed by reference into
//! each bridge constructor - there is no implicit process-wide tracer.

pub mod otel;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use opentelemetry::trace::Status;
use opentelemetry::{Context, KeyValue};
use parking_lot::Mutex;

pub use otel::OtelSink;

/// Destination for bridge spans
pub trait SpanSink: Send + Sync + 'static {
    /// Open a span under `parent`. `None` means the sink cannot take a span
    /// right now (resource exhaustion); the bridge then degrades to an inert
    /// chain instead of raising.
    fn open(
        &self,
        parent: &Context,
        name: &'static str,
        attrs: Vec<KeyValue>,
    ) -> Option<Box<dyn OpenSpan>>;
}

/// One live span held by a continuation chain
pub trait OpenSpan: Send {
    /// Attach a timestamped, non-terminal event to the span
    fn add_event(&mut self, name: &'static str, attrs: Vec<KeyValue>);

    /// Set final attributes and status, then end the span
    fn close(&mut self, status: Status, attrs: Vec<KeyValue>);

    /// Context carrying this span, for parenting nested operations
    fn child_context(&self) -> Context;
}

/// Arc wrapper for trait object usage
pub type SharedSink = Arc<dyn SpanSink>;

/// No-op sink - opens nothing, costs nothing
#[derive(Clone, Copy, Default)]
pub struct NoopSink;

impl SpanSink for NoopSink {
    #[inline]
    fn open(
        &self,
        _parent: &Context,
        _name: &'static str,
        _attrs: Vec<KeyValue>,
    ) -> Option<Box<dyn OpenSpan>> {
        None
    }
}

/// One entry in the recording sink's ordered log
#[derive(Debug, Clone, PartialEq)]
pub enum TraceOp {
    Open {
        span: u64,
        parent: Option<u64>,
        name: &'static str,
        attrs: Vec<KeyValue>,
    },
    Event {
        span: u64,
        name: &'static str,
        attrs: Vec<KeyValue>,
    },
    Close {
        span: u64,
        status: Status,
        attrs: Vec<KeyValue>,
    },
}

impl TraceOp {
    /// Span id this entry belongs to
    pub fn span(&self) -> u64 {
        match self {
            TraceOp::Open { span, .. }
            | TraceOp::Event { span, .. }
            | TraceOp::Close { span, .. } => *span,
        }
    }
}

/// Marker stored in child contexts so nested opens can find their parent
#[derive(Clone, Copy, Debug)]
struct RecordedParent(u64);

/// Recording sink for tests - logs every open/event/close in arrival order.
/// The log is shared with the spans it hands out, so entries land in one
/// global sequence no matter which chain produced them.
#[derive(Default)]
pub struct RecordingSink {
    log: Arc<Mutex<Vec<TraceOp>>>,
    next_id: AtomicU64,
    /// When set, opens beyond the limit return `None`
    capacity: Option<u64>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that refuses opens once `limit` spans have been handed out,
    /// for exercising the exhaustion path
    pub fn with_capacity(limit: u64) -> Self {
        RecordingSink {
            capacity: Some(limit),
            ..Self::default()
        }
    }

    /// Full log in arrival order
    pub fn log(&self) -> Vec<TraceOp> {
        self.log.lock().clone()
    }

    /// Entries belonging to one span, in arrival order
    pub fn log_for(&self, span: u64) -> Vec<TraceOp> {
        self.log
            .lock()
            .iter()
            .filter(|op| op.span() == span)
            .cloned()
            .collect()
    }

    /// Ids of spans that were opened, in open order
    pub fn opened(&self) -> Vec<u64> {
        self.log
            .lock()
            .iter()
            .filter_map(|op| match op {
                TraceOp::Open { span, .. } => Some(*span),
                _ => None,
            })
            .collect()
    }

    /// Spans opened but not yet closed
    pub fn open_count(&self) -> usize {
        let log = self.log.lock();
        let opens = log
            .iter()
            .filter(|op| matches!(op, TraceOp::Open { .. }))
            .count();
        let closes = log
            .iter()
            .filter(|op| matches!(op, TraceOp::Close { .. }))
            .count();
        opens.saturating_sub(closes)
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl SpanSink for RecordingSink {
    fn open(
        &self,
        parent: &Context,
        name: &'static str,
        attrs: Vec<KeyValue>,
    ) -> Option<Box<dyn OpenSpan>> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.capacity {
            if id >= limit {
                return None;
            }
        }
        let parent_id = parent.get::<RecordedParent>().map(|p| p.0);
        self.log.lock().push(TraceOp::Open {
            span: id,
            parent: parent_id,
            name,
            attrs,
        });
        Some(Box::new(RecordedSpan {
            id,
            context: parent.with_value(RecordedParent(id)),
            log: Arc::clone(&self.log),
        }))
    }
}

struct RecordedSpan {
    id: u64,
    context: Context,
    log: Arc<Mutex<Vec<TraceOp>>>,
}

impl OpenSpan for RecordedSpan {
    fn add_event(&mut self, name: &'static str, attrs: Vec<KeyValue>) {
        self.log.lock().push(TraceOp::Event {
            span: self.id,
            name,
            attrs,
        });
    }

    fn close(&mut self, status: Status, attrs: Vec<KeyValue>) {
        self.log.lock().push(TraceOp::Close {
            span: self.id,
            status,
            attrs,
        });
    }

    fn child_context(&self) -> Context {
        self.context.clone()
    }
}

/// Create a no-op sink
pub fn noop_sink() -> SharedSink {
    Arc::new(NoopSink)
}

/// Create a recording sink for tests
pub fn recording_sink() -> Arc<RecordingSink> {
    Arc::new(RecordingSink::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_logs_in_order() {
        let sink = RecordingSink::new();
        let cx = Context::new();

        let mut span = sink
            .open(&cx, "op", vec![KeyValue::new("k", "v")])
            .expect("open should succeed");
        span.add_event("step", Vec::new());
        span.close(Status::Ok, Vec::new());

        let log = sink.log();
        assert_eq!(log.len(), 3);
        assert!(matches!(log[0], TraceOp::Open { .. }));
        assert!(matches!(log[1], TraceOp::Event { .. }));
        assert!(matches!(log[2], TraceOp::Close { .. }));
        assert_eq!(sink.open_count(), 0);
    }

    #[test]
    fn test_child_context_carries_parent_id() {
        let sink = RecordingSink::new();
        let cx = Context::new();

        let parent = sink.open(&cx, "outer", Vec::new()).unwrap();
        let _child = sink.open(&parent.child_context(), "inner", Vec::new());

        match &sink.log()[1] {
            TraceOp::Open { parent, .. } => assert_eq!(*parent, Some(0)),
            other => panic!("expected open, got {:?}", other),
        }
    }

    #[test]
    fn test_capacity_limit_refuses_opens() {
        let sink = RecordingSink::with_capacity(1);
        let cx = Context::new();

        assert!(sink.open(&cx, "first", Vec::new()).is_some());
        assert!(sink.open(&cx, "second", Vec::new()).is_none());
        assert_eq!(sink.opened().len(), 1);
    }

    #[test]
    fn test_open_count_tolerates_double_closed_handle() {
        // The bridge closes each span once, but a raw handle can be driven
        // past that; the counter must not wrap.
        let sink = RecordingSink::new();
        let mut span = sink.open(&Context::new(), "op", Vec::new()).unwrap();
        span.close(Status::Ok, Vec::new());
        span.close(Status::Ok, Vec::new());

        assert_eq!(sink.open_count(), 0);
    }

    #[test]
    fn test_noop_sink_opens_nothing() {
        let sink = NoopSink;
        assert!(sink.open(&Context::new(), "op", Vec::new()).is_none());
    }
}
