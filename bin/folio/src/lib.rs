//! folio CLI library
//!
//! Command implementations behind the `folio` binary.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, check)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use folio::cmd::build::{self, BuildOptions};
//!
//! build::run(Path::new("folio.toml"), &BuildOptions::default()).unwrap();
//! ```

pub mod cmd;

pub use folio_core::{Config, Page};
pub use folio_generator::{BuildReport, BuildStats, Builder};

/// Initialize tracing with the specified verbosity level.
///
/// `verbose` maps 0 to WARN, 1 to INFO, 2 to DEBUG and 3+ to TRACE.
/// `RUST_LOG` directives are honoured on top of that level.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
