//! # Media Sieve
//!
//! Personal media-library tooling: near-duplicate photo removal, bulk upload
//! to object storage with thumbnails and a manifest, and favicon generation.
//!
//! ## Core Philosophy
//! - **Never touch the sources** - results are copies, uploads and reports
//! - **Keep the original** - the earliest-created file of a group survives
//! - **Never abort on one bad file** - failures are recorded and itemized
//!
//! ## Architecture
//! - `core` - scanning, hashing, grouping, conversion, storage and sinks
//! - `events` - event-driven progress reporting
//! - `error` - error types per concern
//!
//! The `media-sieve` binary wraps this library in a CLI.

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{MediaSieveError, Result};

/// Initialize tracing for the library
///
/// `RUST_LOG` wins when set; otherwise the crate logs at `warn`, or `debug`
/// with `verbose`. Calling this twice is harmless.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "media_sieve=debug" } else { "media_sieve=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
