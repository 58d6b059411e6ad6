use log::LevelFilter;

/// Initialize logging for the CLI and tests.
///
/// Respects `debug_enabled` for the default level; an explicit `RUST_LOG`
/// overrides it. Timestamps and module paths are suppressed to keep the
/// progress stream readable.
pub fn init_logger(debug_enabled: bool) {
    use std::env;

    let level = if debug_enabled {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter(None, level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false);

    // Let RUST_LOG override our defaults if explicitly set
    if let Ok(spec) = env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    // try_init: harmless if a test harness initialized logging already
    let _ = builder.try_init();
}
