//! Where command lines come from.
//!
//! A [`LineReader`] shows the prompt and hands back one line at a time. Piped
//! or redirected input goes through [`BufferedReader`]; an interactive
//! terminal gets line editing from [`EditorReader`].

use crate::error::{ShellError, ShellResult};
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::io::{BufRead, Write};
use tracing::trace;

/// Source of command lines for the REPL.
pub trait LineReader {
    /// Show `prompt` and read one line without its terminator.
    ///
    /// Returns `Ok(None)` at end of input. `stdout` is the shell's output
    /// stream, for readers that don't render the prompt themselves.
    fn read_line(&mut self, prompt: &str, stdout: &mut dyn Write) -> ShellResult<Option<String>>;
}

/// Reads raw bytes up to each `\n` from any [`BufRead`].
///
/// There is no line length limit; the buffer grows as needed and a failure
/// to grow it is reported as [`ShellError::Allocation`]. A last line with no
/// terminator is still returned. Bytes that are not valid UTF-8 are replaced.
pub struct BufferedReader<R> {
    input: R,
}

impl<R: BufRead> BufferedReader<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    fn read_raw_line(&mut self) -> ShellResult<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let mut saw_input = false;
        loop {
            let chunk = match self.input.fill_buf() {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if chunk.is_empty() {
                return Ok(saw_input.then_some(line));
            }
            saw_input = true;

            let (take, done) = match chunk.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos, true),
                None => (chunk.len(), false),
            };
            line.try_reserve(take)
                .map_err(|_| ShellError::Allocation)?;
            line.extend_from_slice(&chunk[..take]);

            // the newline itself is consumed but not kept
            self.input.consume(if done { take + 1 } else { take });
            if done {
                return Ok(Some(line));
            }
        }
    }
}

impl<R: BufRead> LineReader for BufferedReader<R> {
    fn read_line(&mut self, prompt: &str, stdout: &mut dyn Write) -> ShellResult<Option<String>> {
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let line = self
            .read_raw_line()?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
        if line.is_none() {
            trace!("end of input");
        }
        Ok(line)
    }
}

/// Interactive reader backed by a `rustyline` editor.
///
/// History is not kept. `Ctrl-D` ends the input and `Ctrl-C` abandons the
/// line being typed.
pub struct EditorReader {
    editor: DefaultEditor,
}

impl EditorReader {
    pub fn new() -> ShellResult<Self> {
        let config = Config::builder().auto_add_history(false).build();
        let editor = DefaultEditor::with_config(config).map_err(into_shell_error)?;
        Ok(Self { editor })
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str, _stdout: &mut dyn Write) -> ShellResult<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => {
                trace!("end of input");
                Ok(None)
            }
            Err(e) => Err(into_shell_error(e)),
        }
    }
}

fn into_shell_error(err: ReadlineError) -> ShellError {
    match err {
        ReadlineError::Io(e) => ShellError::Io(e),
        other => ShellError::Io(std::io::Error::other(other.to_string())),
    }
}
