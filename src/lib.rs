//! LSH, a tiny interactive shell.
//!
//! The shell reads a line, splits it on whitespace and either runs one of a
//! handful of built-in commands in-process or launches an external program
//! and waits for it. There is no grammar: no quoting, pipes, redirection or
//! globbing. The only state kept between commands is the working directory
//! and a small table of variables set with `export` and read back by
//! `echo $NAME`.
//!
//! The main entry point is [`Interpreter`]. The public modules expose the
//! pieces it is built from so they can be driven and tested on their own.

pub mod builtin;
pub mod command;
pub mod env;
pub mod error;
pub mod external;
pub mod input;
mod interpreter;
pub mod lexer;

pub use command::Disposition;
pub use error::{ShellError, ShellResult};
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::{Interpreter, prompt};

/// Serializes tests that change the process working directory.
#[cfg(test)]
pub(crate) fn lock_current_dir() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
