//! Tracing subscriber setup for the binary.
//!
//! Output goes to stderr so command output on stdout stays pipeable. The
//! filter comes from `RUST_LOG`, falling back to `info` for this crate (or `debug` with
//! `--verbose`).

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default = if verbose {
        "warn,stickerkit_lib=debug"
    } else {
        "warn,stickerkit_lib=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
