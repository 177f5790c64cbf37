//! Structured logging setup. Controlled entirely by `RUST_LOG`; defaults
//! to `warn` so a normal interactive session stays quiet. Never logs
//! passphrases, derived keys, or item plaintext — only operation names,
//! file paths, and error categories.

pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
