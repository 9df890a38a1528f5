use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{BatchConfigBuilder, BatchSpanProcessor, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::errors::ServerError;

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;

const SERVICE_NAME: &str = "bug_warden";

/// Builds a tracer provider that exports spans over OTLP/HTTP to `endpoint`.
pub fn build_tracer_provider(endpoint: &str) -> Result<SdkTracerProvider, ServerError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| {
            ServerError::TelemetryError(format!(
                "Failed to create the OTLP exporter for {}. Error was: {}",
                endpoint, e
            ))
        })?;

    let processor = BatchSpanProcessor::builder(exporter)
        .with_batch_config(
            BatchConfigBuilder::default()
                .with_max_queue_size(4096)
                .build(),
        )
        .build();

    let resource = Resource::builder()
        .with_attribute(opentelemetry::KeyValue::new("service.name", SERVICE_NAME))
        .build();

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_span_processor(processor)
        .build())
}

/// Installs the global tracing subscriber.
///
/// Log lines always go to stdout, filtered through `RUST_LOG`. When an OTLP
/// endpoint is given, spans are exported there as well and the returned provider
/// must be kept alive (and shut down) by the caller.
pub fn init_telemetry(
    otlp_endpoint: Option<&str>,
) -> Result<Option<SdkTracerProvider>, ServerError> {
    let provider = otlp_endpoint.map(build_tracer_provider).transpose()?;
    let telemetry = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(SERVICE_NAME)));

    tracing_subscriber::registry()
        .with(telemetry)
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .map_err(|e| {
            ServerError::TelemetryError(format!("Failed to initialize logging: {}", e))
        })?;

    Ok(provider)
}
