//! Fault Isolation Tests
//!
//! Tests that verify instrumentation failures never reach the traced call:
//! 1. A panicking parameter formatter yields the sentinel, not a panic
//! 2. Sink exhaustion at open degrades to an inert chain
//! 3. A second terminal call never double-closes a span
//! 4. Concurrent chains never interleave attributes onto each other's spans

use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread;

use opentelemetry::{Context, KeyValue};

use dbtrace_otel::attrs::FORMAT_SENTINEL;
use dbtrace_otel::bridge::{self, diagnostics};
use dbtrace_otel::events::{
    ExecuteDone, ExecuteStart, StreamExecuteDone, StreamExecuteIntermediate, StreamExecuteStart,
};
use dbtrace_otel::sink::{recording_sink, RecordingSink, SharedSink, TraceOp};
use dbtrace_otel::Details;

struct PanickingParams;

impl fmt::Display for PanickingParams {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        panic!("parameter marshalling failed")
    }
}

// ============================================================================
// Guarded formatting at the bridge boundary
// ============================================================================

#[test]
fn test_panicking_parameters_become_sentinel() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));

    let sink = recording_sink();
    let shared: SharedSink = sink.clone();
    let scripting = bridge::scripting(Details::SCRIPTING, &shared);

    let cx = Context::new();
    let mut chain = scripting.on_execute(ExecuteStart {
        context: &cx,
        query: "q",
        parameters: Some(&PanickingParams),
    });
    chain.on_done(ExecuteDone {
        error: None,
        result: None,
    });

    std::panic::set_hook(hook);

    let log = sink.log();
    assert_eq!(log.len(), 2, "chain must still open and close normally");
    match &log[0] {
        TraceOp::Open { attrs, .. } => {
            assert!(
                attrs.contains(&KeyValue::new("db.operation.parameters", FORMAT_SENTINEL)),
                "failing formatter must be replaced by the sentinel"
            );
        }
        other => panic!("expected open, got {:?}", other),
    }
}

// ============================================================================
// Sink exhaustion: open refused, chain degrades to inert
// ============================================================================

#[test]
fn test_exhausted_sink_yields_inert_chain() {
    let sink = Arc::new(RecordingSink::with_capacity(0));
    let shared: SharedSink = sink.clone();
    let scripting = bridge::scripting(Details::SCRIPTING, &shared);

    let cx = Context::new();
    let mut chain = scripting.on_stream_execute(StreamExecuteStart {
        context: &cx,
        query: "q",
        parameters: None,
    });
    assert!(chain.context().is_none());

    chain.on_intermediate(StreamExecuteIntermediate { error: None });
    chain.on_done(StreamExecuteDone { error: None });

    assert!(sink.log().is_empty(), "refused open must record nothing");
}

// ============================================================================
// Double terminal: single close, counted no-op after
// ============================================================================

#[test]
fn test_second_done_is_counted_noop() {
    let sink = recording_sink();
    let shared: SharedSink = sink.clone();
    let scripting = bridge::scripting(Details::SCRIPTING, &shared);

    let strays_before = diagnostics().stray_terminals;

    let cx = Context::new();
    let mut chain = scripting.on_stream_execute(StreamExecuteStart {
        context: &cx,
        query: "q",
        parameters: None,
    });
    chain.on_done(StreamExecuteDone { error: None });
    chain.on_done(StreamExecuteDone { error: None });
    // Intermediate after close is equally stray
    chain.on_intermediate(StreamExecuteIntermediate { error: None });

    let closes = sink
        .log()
        .iter()
        .filter(|op| matches!(op, TraceOp::Close { .. }))
        .count();
    assert_eq!(closes, 1, "span must close exactly once");
    assert!(
        diagnostics().stray_terminals >= strays_before + 2,
        "stray hooks must be counted"
    );
}

// ============================================================================
// Concurrent chains stay isolated
// ============================================================================

#[test]
fn test_concurrent_chains_never_cross_attribute() {
    let sink = recording_sink();

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let shared: SharedSink = sink.clone();
            thread::spawn(move || {
                let scripting = bridge::scripting(Details::SCRIPTING, &shared);
                let query = format!("select {}", worker);
                let cx = Context::new();
                let mut chain = scripting.on_stream_execute(StreamExecuteStart {
                    context: &cx,
                    query: &query,
                    parameters: None,
                });
                let err = io::Error::new(io::ErrorKind::Other, format!("err-{}", worker));
                for batch in 0..50 {
                    let error = (batch % 2 == 1).then_some(&err as &(dyn std::error::Error));
                    chain.on_intermediate(StreamExecuteIntermediate { error });
                }
                chain.on_done(StreamExecuteDone { error: None });
                query
            })
        })
        .collect();

    let queries: Vec<String> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    // Every chain: exactly one open carrying its own query, 50 events, one close
    let opened = sink.opened();
    assert_eq!(opened.len(), 8);
    assert_eq!(sink.open_count(), 0);
    for span in opened {
        let ops = sink.log_for(span);
        assert_eq!(ops.len(), 52, "open + 50 events + close");
        let query = match &ops[0] {
            TraceOp::Open { attrs, .. } => attrs
                .iter()
                .find(|kv| kv.key.as_str() == "db.statement")
                .expect("open carries the query")
                .value
                .to_string(),
            other => panic!("expected open, got {:?}", other),
        };
        assert!(queries.contains(&query));
        // The error message of odd batches must belong to the same worker
        let worker = query.trim_start_matches("select ").to_string();
        for op in &ops[1..=50] {
            if let TraceOp::Event { attrs, .. } = op {
                if let Some(msg) = attrs.iter().find(|kv| kv.key.as_str() == "error.message") {
                    assert_eq!(msg.value.to_string(), format!("err-{}", worker));
                }
            } else {
                panic!("expected event, got {:?}", op);
            }
        }
        assert!(matches!(ops[51], TraceOp::Close { .. }));
    }
}
