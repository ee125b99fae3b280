//! OpenTelemetry span bridge for database driver trace hooks
//!
//! The driver fires structured trace hooks as each operation moves through
//! its lifecycle: a start record when the operation begins, zero or more
//! intermediate records for streaming operations, and a done record when it
//! finishes. This crate turns those hooks into distributed-tracing spans:
//! start opens a span, intermediates annotate it, done sets final status and
//! closes it. Span lifetime follows event arrival, not lexical scope.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dbtrace_otel::{bridge, Details};
//! use dbtrace_otel::sink::{OtelSink, SharedSink};
//! use std::sync::Arc;
//!
//! let sink: SharedSink = Arc::new(OtelSink::new(opentelemetry::global::tracer("dbtrace")));
//! let scripting = bridge::scripting(Details::SCRIPTING | Details::RETRY, &sink);
//!
//! // Driver side, per operation:
//! let mut chain = scripting.on_execute(start_record);
//! // ... operation runs ...
//! chain.on_done(done_record);
//! ```
//!
//! Instrumentation faults never reach the traced call: formatting and sink
//! failures are absorbed and replaced with sentinels (see [`bridge::diagnostics`]).

pub mod attrs;
pub mod bridge;
pub mod details;
pub mod events;
pub mod sink;

// Exporter wiring: feature-gated Datadog pipeline
#[cfg(feature = "datadog")]
pub mod config;
#[cfg(feature = "datadog")]
pub mod setup;

pub use bridge::{retry, scripting, RetryTracer, ScriptingTracer};
pub use details::Details;
pub use sink::{noop_sink, recording_sink, OpenSpan, SharedSink, SpanSink};
