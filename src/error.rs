//! Errors that terminate the shell.

use nix::errno::Errno;
use std::io;
use thiserror::Error;

/// Result type alias for operations that can bring the shell down.
pub type ShellResult<T> = Result<T, ShellError>;

/// Fatal failures. The binary prints them as `lsh: <message>` and exits with
/// a failure status; every other error is handled inside the REPL iteration.
#[derive(Error, Debug)]
pub enum ShellError {
    /// Reading input or writing output failed.
    #[error("{}", describe(.0))]
    Io(#[from] io::Error),

    /// A buffer could not grow.
    #[error("allocation error")]
    Allocation,
}

/// Render an I/O error the way the C library's `perror` would: the bare
/// `strerror` text for OS errors, without Rust's `(os error N)` suffix.
pub fn describe(err: &io::Error) -> String {
    match err.raw_os_error() {
        Some(code) => Errno::from_raw(code).desc().to_string(),
        None => err.to_string(),
    }
}
