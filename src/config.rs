//! Exporter Configuration
//!
//! Environment-driven settings for the Datadog trace pipeline.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DD_SERVICE` | `dbtrace` | Service name |
//! | `DD_ENV` | `development` | Environment tag |
//! | `DD_VERSION` | pkg version | Service version |
//! | `DD_TRACE_AGENT_URL` | `http://127.0.0.1:8126` | APM agent URL |
//! | `DD_TRACE_SAMPLE_RATE` | `1.0` | Trace sampling rate |
//! | `DD_TRACE_DETAILS` | `all` | Instrumented kinds (`retry,scripting`) |

use std::env;

use crate::details::Details;

/// Datadog exporter configuration
#[derive(Debug, Clone)]
pub struct TraceConfig {
    pub service_name: String,
    pub env: String,
    pub version: String,
    pub agent_url: String,
    pub sample_rate: f64,
    /// Operation kinds to instrument
    pub details: Details,
}

impl TraceConfig {
    /// Read configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        TraceConfig {
            service_name: env::var("DD_SERVICE").unwrap_or_else(|_| "dbtrace".to_string()),
            env: env::var("DD_ENV").unwrap_or_else(|_| "development".to_string()),
            version: env::var("DD_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            agent_url: env::var("DD_TRACE_AGENT_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8126".to_string()),
            sample_rate: env::var("DD_TRACE_SAMPLE_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1.0),
            details: env::var("DD_TRACE_DETAILS")
                .map(|v| Details::parse(&v))
                .unwrap_or(Details::ALL),
        }
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_has_usable_defaults() {
        let config = TraceConfig::from_env();
        assert!(!config.agent_url.is_empty());
        assert!(!config.service_name.is_empty());
    }
}
