//! Subscriber and tracer provider setup

use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{Config, SimpleSpanProcessor, TracerProvider};
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Holds the provider for the life of the process once telemetry is initialized
static TRACER_PROVIDER: OnceLock<Arc<TracerProvider>> = OnceLock::new();

/// Span processor builders registered before initialization
type ProcessorBuilder = Box<dyn FnOnce() -> SimpleSpanProcessor + Send>;
static SPAN_PROCESSOR_BUILDERS: Mutex<Option<Vec<ProcessorBuilder>>> = Mutex::new(Some(Vec::new()));

/// Options controlling how logs and spans are emitted
#[derive(Debug, Clone)]
pub struct TelemetryOptions {
    /// Emit one JSON object per log line instead of human-readable text
    pub json: bool,
    /// Filter directive used when `RUST_LOG` is not set
    pub default_directive: String,
    /// `service.name` resource attribute for exported spans
    pub service_name: String,
}

impl Default for TelemetryOptions {
    fn default() -> Self {
        Self {
            json: false,
            default_directive: "warn".to_string(),
            service_name: crate::attributes::SYSTEM_NAME.to_string(),
        }
    }
}

impl TelemetryOptions {
    /// Options for `--verbose` runs: debug output from sqlnav crates
    pub fn verbose() -> Self {
        Self {
            default_directive: "warn,sqlnav=debug,sqlnav_relations=debug,sqlnav_database_tools=debug"
                .to_string(),
            ..Default::default()
        }
    }
}

/// Register a span processor builder to be used when telemetry is initialized.
///
/// Must be called before [`init_telemetry`]; later registrations are ignored
/// with a warning.
///
/// # Example
///
/// ```ignore
/// use sqlnav_telemetry::{register_span_processor, init_telemetry, TelemetryOptions};
/// use opentelemetry_sdk::trace::SimpleSpanProcessor;
///
/// register_span_processor(Box::new(|| {
///     SimpleSpanProcessor::new(Box::new(/* your exporter */))
/// }));
/// init_telemetry(TelemetryOptions::default())?;
/// ```
pub fn register_span_processor(builder: ProcessorBuilder) {
    let mut builders = match SPAN_PROCESSOR_BUILDERS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Some(ref mut vec) = *builders {
        vec.push(builder);
    } else {
        tracing::warn!("Attempted to register span processor after telemetry initialization");
    }
}

/// Initialize logging and tracing.
///
/// Sets up an `EnvFilter` (from `RUST_LOG`, falling back to
/// `options.default_directive`), a fmt layer on stderr in text or JSON form,
/// and an OpenTelemetry layer fed by every registered span processor.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_telemetry(options: TelemetryOptions) -> Result<(), TryInitError> {
    let builders = match SPAN_PROCESSOR_BUILDERS.lock() {
        Ok(mut guard) => guard.take().unwrap_or_default(),
        Err(poisoned) => poisoned.into_inner().take().unwrap_or_default(),
    };

    let mut provider_builder = TracerProvider::builder().with_config(
        Config::default().with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            options.service_name.clone(),
        )])),
    );
    for builder in builders {
        provider_builder = provider_builder.with_span_processor(builder());
    }
    let tracer_provider = provider_builder.build();
    let tracer = tracer_provider.tracer(crate::attributes::SYSTEM_NAME);
    let _ = TRACER_PROVIDER.set(Arc::new(tracer_provider));

    let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.default_directive));

    let (text_layer, json_layer) = if options.json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true);
        (None, Some(layer))
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_line_number(true);
        (Some(layer), None)
    };

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(text_layer)
        .with(json_layer)
        .with(filter)
        .try_init()
}
