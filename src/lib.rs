//! LS-8: an 8-bit toy computer with 256 bytes of memory, eight registers and
//! a descending stack.

pub mod alu;
pub mod core;
pub mod error;
pub mod isa;
pub mod loader;
pub mod mem;

pub use crate::core::Core;
pub use crate::error::{Error, Result};

use std::env;
use std::io::{self, IsTerminal};

use tracing_subscriber::{fmt, EnvFilter};

/// Target of the fatal-error report written by the binary. It stays enabled
/// at `error` whatever `RUST_LOG` says.
pub const REPORT_TARGET: &str = "ls8::report";

/// Builds the filter string: `RUST_LOG` if set and non-empty, else `warn`
/// (`warn,ls8=debug` with tracing on), with the report target appended.
fn filter_directives(rust_log: Option<&str>, trace: bool) -> String {
    let base = match rust_log.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ if trace => "warn,ls8=debug",
        _ => "warn",
    };
    format!("{},{}=error", base, REPORT_TARGET)
}

/// Installs the stderr logger. Colours are only used when stderr is a
/// terminal.
pub fn init_logging(trace: bool) {
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::try_new(filter_directives(rust_log.as_deref(), trace))
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(None, trace)));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}
