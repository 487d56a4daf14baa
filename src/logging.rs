//! Logger setup.
//!
//! The crate logs through the `log` facade only; binaries and tests pick a
//! backend. [`init_logging`] installs `env_logger` with renderer-friendly
//! defaults.

use std::sync::Once;

/// Logger configuration.
///
/// `default_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "tidal=debug,wgpu=warn") and is used when `RUST_LOG` is not set.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub default_filter: String,
    pub show_module: bool,
    pub show_timestamp: bool,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            show_module: true,
            show_timestamp: false,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once. Later calls are ignored.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match std::env::var("RUST_LOG") {
            Ok(filter) => builder.parse_filters(&filter),
            Err(_) => builder.parse_filters(&config.default_filter),
        };

        builder.format_module_path(config.show_module);
        if !config.show_timestamp {
            builder.format_timestamp(None);
        }
        builder.write_style(config.write_style);

        // A test harness may already own the global logger.
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized (default filter: {})", config.default_filter);
    });
}
