use crate::env::VariableStore;
use anyhow::Result;
use std::io::Write;

/// What the REPL should do after a command has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Print the next prompt and keep reading.
    Continue,
    /// Leave the loop and exit successfully.
    Stop,
}

/// Built-in commands known to the shell at compile time.
///
/// Builtins run in-process without spawning a child. They receive the whole
/// token vector (`args[0]` is the command name) and write to the two streams
/// they are handed instead of the process's own, so they can be tested against
/// in-memory buffers.
pub trait BuiltinCommand: Sync {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name(&self) -> &'static str;

    /// Executes the command.
    ///
    /// Usage errors are reported on `stderr` and still yield
    /// [`Disposition::Continue`]. An `Err` means a stream could not be written
    /// and is fatal to the shell.
    fn execute(
        &self,
        args: &[&str],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        vars: &mut VariableStore,
    ) -> Result<Disposition>;
}
