//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber. Call once at process start; the
/// `RUST_LOG` environment filter wins over the default directive.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "svckit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
