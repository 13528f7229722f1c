use std::{io, sync::Once};

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// Fails if a subscriber is already installed for this process.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .with_writer(io::stderr)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_writer(io::stderr)
            .compact()
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Engine counters as `(name, description)`.
const ENGINE_COUNTERS: [(&str, &str); 5] = [
    (
        "tessera_render_sections_total",
        "Sections rendered, including ones that degraded.",
    ),
    (
        "tessera_render_degraded_total",
        "Fragments replaced by an empty or placeholder block, labelled by reason.",
    ),
    (
        "tessera_renderer_panic_total",
        "Element renderer panics caught by safe registration.",
    ),
    (
        "tessera_listing_cache_hit_total",
        "Listing cache hits, labelled by listing.",
    ),
    (
        "tessera_listing_cache_miss_total",
        "Listing cache misses and expirations, labelled by listing.",
    ),
];

/// Register descriptions for the engine's counters with the installed recorder.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        for (name, description) in ENGINE_COUNTERS {
            describe_counter!(name, Unit::Count, description);
        }
    });
}
