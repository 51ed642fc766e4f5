// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Default directives: this crate at `info` (`debug` with `--debug`), while
/// WebDriver and HTTP client chatter stays at `warn`.
pub fn default_directives(debug: bool) -> &'static str {
    if debug {
        "warn,tender_scraper=debug"
    } else {
        "warn,tender_scraper=info"
    }
}

/// Sets up the logging framework using tracing_subscriber.
/// `RUST_LOG` overrides the defaults. Logs go to stderr so stdout carries only the summary.
pub fn setup_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Logging setup complete.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_raises_only_this_crate() {
        assert_eq!(default_directives(false), "warn,tender_scraper=info");
        assert_eq!(default_directives(true), "warn,tender_scraper=debug");
    }

    #[test]
    fn default_directives_parse() {
        assert!(EnvFilter::try_new(default_directives(false)).is_ok());
        assert!(EnvFilter::try_new(default_directives(true)).is_ok());
    }
}
