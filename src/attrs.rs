//! Span Attribute and Status Mapping
//!
//! Converts driver event fields into OpenTelemetry attributes and terminal
//! status, following database semantic conventions. All string conversion
//! goes through the guarded formatter so a misbehaving `Display` impl can
//! never break the traced call.

use std::fmt::{self, Write as _};
use std::panic::{self, AssertUnwindSafe};

use opentelemetry::trace::Status;
use opentelemetry::KeyValue;

use crate::events::DriverError;

/// Substituted whenever a value refuses to format itself
pub const FORMAT_SENTINEL: &str = "<unprintable>";

/// Guarded formatter: render a value to a string, substituting the sentinel
/// on a formatting error or panic. Never propagates a fault.
pub fn display_or_sentinel(value: &dyn fmt::Display) -> String {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut out = String::new();
        write!(out, "{}", value).map(|_| out)
    }));
    match attempt {
        Ok(Ok(text)) => text,
        // fmt::Error or panic inside the Display impl
        _ => FORMAT_SENTINEL.to_string(),
    }
}

/// Terminal status derived strictly from error presence
pub fn status_of(error: Option<&DriverError>) -> Status {
    match error {
        None => Status::Ok,
        Some(err) => Status::error(display_or_sentinel(&err)),
    }
}

/// Query text attribute
pub fn query(text: &str) -> KeyValue {
    KeyValue::new("db.statement", text.to_string())
}

/// Query parameters attribute, guarded
pub fn parameters(params: &dyn fmt::Display) -> KeyValue {
    KeyValue::new("db.operation.parameters", display_or_sentinel(params))
}

/// Error presence flag
pub fn error_flag(present: bool) -> KeyValue {
    KeyValue::new("error", present)
}

/// Error text attribute, guarded
pub fn error_message(err: &DriverError) -> KeyValue {
    KeyValue::new("error.message", display_or_sentinel(&err))
}

/// Caller-declared idempotency of a retried operation
pub fn idempotent(flag: bool) -> KeyValue {
    KeyValue::new("idempotent", flag)
}

/// Final attempt count of a retry loop
pub fn attempts(count: usize) -> KeyValue {
    KeyValue::new("attempts", count as i64)
}

/// Attributes for a non-terminal intermediate event: the error flag, plus
/// the message when an error is present
pub fn intermediate(error: Option<&DriverError>) -> Vec<KeyValue> {
    match error {
        None => vec![error_flag(false)],
        Some(err) => vec![error_flag(true), error_message(err)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingDisplay;

    impl fmt::Display for FailingDisplay {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    struct PanickingDisplay;

    impl fmt::Display for PanickingDisplay {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("display blew up")
        }
    }

    #[test]
    fn test_display_or_sentinel_plain_value() {
        assert_eq!(display_or_sentinel(&42), "42");
        assert_eq!(display_or_sentinel(&"hello"), "hello");
    }

    #[test]
    fn test_display_or_sentinel_fmt_error() {
        assert_eq!(display_or_sentinel(&FailingDisplay), FORMAT_SENTINEL);
    }

    #[test]
    fn test_display_or_sentinel_panic() {
        // Silence the default hook for the deliberate panic
        let hook = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        let rendered = display_or_sentinel(&PanickingDisplay);
        panic::set_hook(hook);
        assert_eq!(rendered, FORMAT_SENTINEL);
    }

    #[test]
    fn test_status_from_error_presence() {
        assert_eq!(status_of(None), Status::Ok);

        let err = io::Error::new(io::ErrorKind::Other, "connection reset");
        match status_of(Some(&err)) {
            Status::Error { description } => assert_eq!(description, "connection reset"),
            other => panic!("expected error status, got {:?}", other),
        }
    }

    #[test]
    fn test_intermediate_attrs() {
        let ok = intermediate(None);
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].key.as_str(), "error");

        let err = io::Error::new(io::ErrorKind::Other, "x");
        let failed = intermediate(Some(&err));
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[1].key.as_str(), "error.message");
    }

    #[test]
    fn test_counter_maps_verbatim() {
        let kv = attempts(7);
        assert_eq!(kv.key.as_str(), "attempts");
        assert_eq!(kv.value, opentelemetry::Value::I64(7));
    }
}
