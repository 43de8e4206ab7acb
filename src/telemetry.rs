use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `default_directives`.
pub fn init_telemetry(default_directives: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_directives))
                .unwrap_or_else(|_| "babyleague_backend=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
