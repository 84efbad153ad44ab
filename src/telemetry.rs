use crate::config::{LogFormat, TelemetryConfig};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{KeyValue, global};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    logs::SdkLoggerProvider,
    metrics::{PeriodicReader, SdkMeterProvider},
    propagation::TraceContextPropagator,
    trace::SdkTracerProvider,
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use std::time::Duration;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE: &str = "rapport-server";
const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn,h2=warn,tonic=warn";

/// Holds the OTLP providers so they can be flushed before the process exits.
#[derive(Debug, Default)]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl TelemetryGuard {
    /// Flushes and shuts down every exporter that was started.
    pub fn shutdown(self) {
        if let Some(provider) = self.tracer_provider
            && let Err(e) = provider.shutdown()
        {
            tracing::warn!(error = %e, "Failed to shut down tracer provider");
        }
        if let Some(provider) = self.meter_provider
            && let Err(e) = provider.shutdown()
        {
            tracing::warn!(error = %e, "Failed to shut down meter provider");
        }
        if let Some(provider) = self.logger_provider
            && let Err(e) = provider.shutdown()
        {
            tracing::warn!(error = %e, "Failed to shut down logger provider");
        }
    }
}

struct OtlpProviders {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
    logger_provider: SdkLoggerProvider,
}

fn build_otlp_providers(endpoint: &str, config: &TelemetryConfig) -> anyhow::Result<OtlpProviders> {
    let resource = Resource::builder()
        .with_attributes(vec![
            KeyValue::new(SERVICE_NAME, SERVICE),
            KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        ])
        .build();

    global::set_text_map_propagator(TraceContextPropagator::new());

    let span_exporter = opentelemetry_otlp::SpanExporter::builder().with_tonic().with_endpoint(endpoint).build()?;
    let tracer_provider =
        SdkTracerProvider::builder().with_resource(resource.clone()).with_batch_exporter(span_exporter).build();

    let metric_exporter =
        opentelemetry_otlp::MetricExporter::builder().with_tonic().with_endpoint(endpoint).build()?;
    let reader = PeriodicReader::builder(metric_exporter)
        .with_interval(Duration::from_secs(config.metrics_export_interval_secs.max(1)))
        .build();
    let meter_provider = SdkMeterProvider::builder().with_resource(resource.clone()).with_reader(reader).build();

    let log_exporter = opentelemetry_otlp::LogExporter::builder().with_tonic().with_endpoint(endpoint).build()?;
    let logger_provider = SdkLoggerProvider::builder().with_resource(resource).with_batch_exporter(log_exporter).build();

    global::set_tracer_provider(tracer_provider.clone());
    global::set_meter_provider(meter_provider.clone());

    Ok(OtlpProviders { tracer_provider, meter_provider, logger_provider })
}

/// Installs the global tracing subscriber and, when an OTLP endpoint is configured,
/// exports traces, metrics and logs to it.
///
/// # Errors
/// Returns an error if an OTLP exporter cannot be built.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let providers = config.otlp_endpoint.as_deref().map(|endpoint| build_otlp_providers(endpoint, config)).transpose()?;

    let trace_layer =
        providers.as_ref().map(|p| OpenTelemetryLayer::new(p.tracer_provider.tracer(SERVICE)));
    // Exporter internals must not feed back into the log pipeline.
    let log_layer = providers.as_ref().map(|p| {
        OpenTelemetryTracingBridge::new(&p.logger_provider)
            .with_filter(EnvFilter::new("info,opentelemetry=off,tonic=off,h2=off,hyper=off"))
    });

    let registry = Registry::default().with(filter).with(trace_layer).with(log_layer);

    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }

    Ok(providers.map_or_else(TelemetryGuard::default, |p| TelemetryGuard {
        tracer_provider: Some(p.tracer_provider),
        meter_provider: Some(p.meter_provider),
        logger_provider: Some(p.logger_provider),
    }))
}
