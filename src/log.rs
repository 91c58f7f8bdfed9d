use std::env;

use log::LevelFilter;

/// Initialize logging for the crossfill binary.
///
/// Logs at `Info` by default and `Debug` when `debug_enabled` is set. An explicit `RUST_LOG`
/// takes precedence over both. The library itself only emits through the `log` facade and never
/// calls this.
pub fn init_logger(debug_enabled: bool) {
    let level = if debug_enabled { LevelFilter::Debug } else { LevelFilter::Info };

    let mut builder = env_logger::Builder::new();
    builder.filter(None, level).format_timestamp(None).format_module_path(false).format_target(false);

    if let Ok(spec) = env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    // A second initialization (e.g. from an embedding program) is harmless.
    if builder.try_init().is_ok() {
        log::debug!("Logger initialized at {level:?} level");
    }
}
