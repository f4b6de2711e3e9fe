use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

/// Fallback log filter when `RUST_LOG` is unset.
pub const LOG_ENV: &str = "MODELGEN_LOG";

pub const DEFAULT_SUPPORT_CRATE: &str = "mqtt_modelgen";

/// Resolved driver settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub schema: PathBuf,
    pub out_dir: PathBuf,
    pub docs: Option<DocsSettings>,
    /// Crate path generated code imports `support` from.
    pub support_crate: String,
    pub verbosity: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocsSettings {
    pub out_dir: PathBuf,
    pub version: String,
}

pub fn verbosity_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize the tracing subscriber on stderr.
///
/// Respects RUST_LOG, then MODELGEN_LOG, then the `-v` count.
pub fn init_tracing(verbosity: u8) {
    let fallback = std::env::var(LOG_ENV).unwrap_or_else(|_| verbosity_directive(verbosity).to_string());

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(verbosity_directive(0), "warn");
        assert_eq!(verbosity_directive(1), "info");
        assert_eq!(verbosity_directive(2), "debug");
        assert_eq!(verbosity_directive(9), "trace");
    }
}
