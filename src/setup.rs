//! Trace Pipeline Setup
//!
//! Installs the OpenTelemetry pipeline with the Datadog exporter and wires
//! tracing-subscriber on top of it. Everything here is operator-facing glue;
//! the bridge itself only ever sees a [`SharedSink`].

use std::sync::Arc;

use opentelemetry_datadog::DatadogPropagator;
use opentelemetry_sdk::trace::Sampler;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::TraceConfig;
use crate::sink::{OtelSink, SharedSink};

/// Initialize the trace pipeline
///
/// Sets up:
/// - OpenTelemetry with Datadog exporter for distributed tracing
/// - tracing-subscriber with environment-based filtering
pub fn init(config: &TraceConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Datadog headers carry trace context across service boundaries
    opentelemetry::global::set_text_map_propagator(DatadogPropagator::default());

    let tracer = opentelemetry_datadog::new_pipeline()
        .with_service_name(&config.service_name)
        .with_agent_endpoint(&config.agent_url)
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::TraceIdRatioBased(config.sample_rate))
                .with_resource(opentelemetry_sdk::Resource::new(vec![
                    opentelemetry::KeyValue::new("service.name", config.service_name.clone()),
                    opentelemetry::KeyValue::new("service.version", config.version.clone()),
                    opentelemetry::KeyValue::new("deployment.environment", config.env.clone()),
                ])),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // fmt before otel: log lines should show spans before they ship to the agent
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .init();

    tracing::info!(
        service = %config.service_name,
        env = %config.env,
        version = %config.version,
        sample_rate = %config.sample_rate,
        "trace pipeline initialized"
    );

    Ok(())
}

/// Span sink backed by the installed provider, for handing to the bridge
/// constructors
pub fn sink() -> SharedSink {
    Arc::new(OtelSink::new(opentelemetry::global::tracer("dbtrace")))
}

/// Shutdown tracing gracefully
///
/// Flushes any pending spans to the Datadog agent.
/// Should be called before application exit.
pub fn shutdown() {
    tracing::info!("shutting down trace pipeline...");
    opentelemetry::global::shutdown_tracer_provider();
}
