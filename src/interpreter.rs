use crate::builtin::find_builtin;
use crate::command::Disposition;
use crate::env::VariableStore;
use crate::error::{ShellError, ShellResult};
use crate::external::{ForkExec, Launcher};
use crate::input::LineReader;
use crate::lexer;
use std::env;
use std::io::Write;
use tracing::debug;

/// A minimal shell that executes built-in and external commands.
///
/// The interpreter owns the [`VariableStore`] for the session and a
/// [`Launcher`] for everything that isn't a built-in. It writes to the
/// streams passed into each call, so the whole loop can run against
/// in-memory buffers.
///
/// Example
/// ```
/// use lsh::{Disposition, Interpreter};
/// let mut sh = Interpreter::default();
/// let (mut out, mut err) = (Vec::new(), Vec::new());
/// sh.execute(&["export", "A=hello"], &mut out, &mut err).unwrap();
/// sh.execute(&["echo", "$A"], &mut out, &mut err).unwrap();
/// assert_eq!(err, b"hello \n");
/// assert_eq!(sh.execute(&["exit"], &mut out, &mut err).unwrap(), Disposition::Stop);
/// ```
pub struct Interpreter<L = ForkExec> {
    vars: VariableStore,
    launcher: L,
}

impl<L: Launcher> Interpreter<L> {
    /// Create an interpreter with an empty variable store.
    pub fn new(launcher: L) -> Self {
        Self {
            vars: VariableStore::new(),
            launcher,
        }
    }

    pub fn vars(&self) -> &VariableStore {
        &self.vars
    }

    /// Run one tokenized command.
    ///
    /// An empty token vector does nothing. A built-in is run in-process and
    /// decides the disposition; anything else goes to the launcher and the
    /// shell continues.
    pub fn execute(
        &mut self,
        args: &[&str],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> anyhow::Result<Disposition> {
        let Some(&name) = args.first() else {
            return Ok(Disposition::Continue);
        };

        match find_builtin(name) {
            Some(builtin) => {
                debug!(command = name, "running builtin");
                builtin.execute(args, stdout, stderr, &mut self.vars)
            }
            None => {
                debug!(command = name, "launching external command");
                self.launcher.launch(args, stderr)?;
                Ok(Disposition::Continue)
            }
        }
    }

    /// Read-Eval-Print Loop.
    ///
    /// Prompts with the current directory, reads a line, splits it into
    /// tokens and executes it, until a command stops the shell or the input
    /// runs out. Both end the loop with `Ok`; only I/O and allocation
    /// failures are errors.
    pub fn repl(
        &mut self,
        reader: &mut dyn LineReader,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> ShellResult<()> {
        loop {
            let prompt = prompt();
            let Some(line) = reader.read_line(&prompt, stdout)? else {
                return Ok(());
            };

            let tokens = lexer::split_into_tokens(&line);
            let disposition = self
                .execute(&tokens, stdout, stderr)
                .map_err(into_shell_error)?;
            stdout.flush()?;
            stderr.flush()?;

            if disposition == Disposition::Stop {
                return Ok(());
            }
        }
    }
}

impl Default for Interpreter {
    /// Create an interpreter that launches external programs with
    /// fork and exec.
    fn default() -> Self {
        Self::new(ForkExec)
    }
}

/// The prompt: `> <cwd>$ `.
///
/// An unreadable working directory (e.g. it was removed) shows as empty.
pub fn prompt() -> String {
    let cwd = env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();
    format!("> {cwd}$ ")
}

fn into_shell_error(err: anyhow::Error) -> ShellError {
    match err.downcast::<std::io::Error>() {
        Ok(io) => ShellError::Io(io),
        Err(other) => ShellError::Io(std::io::Error::other(other.to_string())),
    }
}
