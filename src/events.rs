//! Driver Trace Event Records
//!
//! The records the driver hands to the bridge at each stage of an operation.
//! Every record is borrowed: the driver constructs it on its own stack and the
//! bridge consumes it synchronously inside the hook call, so nothing here
//! outlives the callback.
//!
//! Each operation kind has a Start record, a Done record, and - for streaming
//! kinds - an Intermediate record. The Done record is distinguishable from the
//! Intermediate record only by its type, which is how the driver signals that
//! the chain is finished.

use std::error::Error;
use std::fmt;

use opentelemetry::Context;

/// Driver error as reported in a trace record. The bridge only reads its
/// text; it never retries or reinterprets the failure.
pub type DriverError = dyn Error + 'static;

/// A result value that can report its own failure, consulted when the
/// operation-level error is absent.
pub trait OperationResult {
    /// The error carried inside the result, if any
    fn err(&self) -> Option<&DriverError>;
}

/// Start of a one-shot scripting execution
pub struct ExecuteStart<'a> {
    /// Ambient context; an active parent span here makes the new span a child
    pub context: &'a Context,
    pub query: &'a str,
    /// Query parameters; rendered through the guarded formatter
    pub parameters: Option<&'a dyn fmt::Display>,
}

/// End of a one-shot scripting execution
pub struct ExecuteDone<'a> {
    pub error: Option<&'a DriverError>,
    pub result: Option<&'a dyn OperationResult>,
}

/// Start of a streaming scripting execution
pub struct StreamExecuteStart<'a> {
    pub context: &'a Context,
    pub query: &'a str,
    pub parameters: Option<&'a dyn fmt::Display>,
}

/// One streamed batch; arrives zero or more times before the Done record
pub struct StreamExecuteIntermediate<'a> {
    pub error: Option<&'a DriverError>,
}

/// End of a streaming scripting execution
pub struct StreamExecuteDone<'a> {
    pub error: Option<&'a DriverError>,
}

/// Start of a query plan request
pub struct ExplainStart<'a> {
    pub context: &'a Context,
    pub query: &'a str,
}

/// End of a query plan request
pub struct ExplainDone<'a> {
    pub error: Option<&'a DriverError>,
}

/// Start of a scripting client shutdown
pub struct CloseStart<'a> {
    pub context: &'a Context,
}

/// End of a scripting client shutdown
pub struct CloseDone<'a> {
    pub error: Option<&'a DriverError>,
}

/// Start of a retry loop around some driver operation
pub struct RetryStart<'a> {
    pub context: &'a Context,
    /// Caller's declaration; recorded once at span open
    pub idempotent: bool,
}

/// One finished retry attempt; arrives zero or more times
pub struct RetryIntermediate<'a> {
    pub error: Option<&'a DriverError>,
}

/// End of the retry loop
pub struct RetryDone<'a> {
    pub error: Option<&'a DriverError>,
    /// Total attempts made, recorded as a span attribute at close
    pub attempts: usize,
}
