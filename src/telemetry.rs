/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_filter`; `LOG_FORMAT=json` switches to JSON lines.
pub fn init(default_filter: &str) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    // try_init: a second call (tests, embedded use) keeps the first subscriber
    let result = if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).try_init()
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}
