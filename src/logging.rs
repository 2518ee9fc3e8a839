use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info,lti_grader=debug";

/// Initialize tracing with stdout and Sentry layers.
///
/// - Stdout: compact, human-readable
/// - Sentry: captures ERROR events as issues, WARN as breadcrumbs
/// - Default level: INFO (debug for this crate), override via RUST_LOG env
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .compact();

    // No-op when Sentry DSN is not configured.
    let sentry_layer = sentry_tracing::layer().event_filter(|meta| match *meta.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    });

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(sentry_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Tracing initialized");
    }
}

/// Sentry client options. The DSN is baked in at build time; without one the
/// returned guard is a no-op.
pub fn sentry_options() -> sentry::ClientOptions {
    sentry::ClientOptions {
        dsn: option_env!("SENTRY_DSN").and_then(|s| s.parse().ok()),
        release: Some(env!("CARGO_PKG_VERSION").into()),
        traces_sample_rate: 0.0,
        send_default_pii: false,
        before_send: Some(std::sync::Arc::new(|mut event| {
            // Student emails appear in request paths; never ship them.
            if let Some(ref mut user) = event.user {
                user.email = None;
                user.ip_address = None;
                user.username = None;
            }
            if let Some(ref mut request) = event.request {
                request.data = None;
                request.url = None;
            }
            Some(event)
        })),
        ..Default::default()
    }
}
