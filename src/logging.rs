//! `env_logger` setup for the benchmark and for binaries embedding the
//! converter.
//!
//! Conversion code only reports through `log`: rejected requests and unknown
//! format ids at `warn`, clipped-away requests at `debug`, kernel choice at
//! `trace`.

use std::sync::Once;

/// Filter used when neither the config nor `RUST_LOG` names one. Rejected
/// uploads are the only thing a renderer normally wants to hear about.
pub const DEFAULT_FILTER: &str = "warn";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` directives such as `"surface_convert=trace"`. Takes
    /// precedence over `RUST_LOG`.
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    fn resolve_filter(&self, rust_log: Option<String>) -> String {
        self.env_filter
            .clone()
            .or(rust_log)
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_owned())
    }
}

static INIT: Once = Once::new();

/// Install the process logger on first call; later calls do nothing.
///
/// If the host already installed a logger it stays in charge.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.resolve_filter(std::env::var("RUST_LOG").ok());
        let installed = env_logger::Builder::new()
            .parse_filters(&filter)
            .write_style(config.write_style)
            .try_init()
            .is_ok();
        if installed {
            log::debug!("surface-convert logging on ({filter})");
        }
    });
}
