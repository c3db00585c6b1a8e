use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Logs go to stderr so rendered output on
/// stdout stays clean for piping.
pub fn init_tracing(component: &str) {
    let default_filter = format!("warn,kreat=info,{component}=info");

    let filter = std::env::var("KREAT_LOG")
        .ok()
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .try_init();
}
