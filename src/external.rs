use anyhow::Result;
use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::libc::_exit;
use nix::sys::signal::{SigHandler, Signal, signal};
use nix::unistd::{ForkResult, Pid, execvp, fork, write};
use std::ffi::CString;
use std::io::{self, Write};
use std::os::fd::AsFd;
use tracing::{debug, trace};

/// Runs programs that are not built-ins.
///
/// The shell calls [`Launcher::launch`] with the full token vector and only
/// returns to the prompt once it comes back. Launch failures are reported on
/// `stderr` and are not errors; an `Err` is reserved for failing to write to
/// the streams themselves.
pub trait Launcher {
    fn launch(&mut self, args: &[&str], stderr: &mut dyn Write) -> Result<()>;
}

/// Launcher that forks, `execvp`s the program in the child (so `PATH` is
/// searched) and waits for the child to exit or be killed.
///
/// The child's exit status is never reported back to the shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForkExec;

impl Launcher for ForkExec {
    fn launch(&mut self, args: &[&str], stderr: &mut dyn Write) -> Result<()> {
        let argv = match externalize(args) {
            Ok(argv) => argv,
            Err(e) => {
                writeln!(stderr, "lsh: {e}")?;
                return Ok(());
            }
        };

        // anything still buffered would otherwise be written twice
        io::stdout().flush()?;
        stderr.flush()?;

        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                // the Rust runtime ignores SIGPIPE and exec would keep that
                unsafe {
                    let _ = signal(Signal::SIGPIPE, SigHandler::SigDfl);
                }
                match execvp(&argv[0], &argv) {
                    Ok(never) => match never {},
                    Err(errno) => {
                        report_in_child(errno);
                        unsafe { _exit(1) }
                    }
                }
            }
            Ok(ForkResult::Parent { child }) => {
                debug!(pid = %child, program = args[0], "spawned child");
                wait_for_termination(child, stderr)?;
            }
            Err(errno) => {
                writeln!(stderr, "lsh: {}", errno.desc())?;
            }
        }
        Ok(())
    }
}

/// Block until `child` has exited or been killed by a signal.
///
/// Stop and continue notifications do not end the wait.
fn wait_for_termination(child: Pid, stderr: &mut dyn Write) -> Result<()> {
    loop {
        match waitpid(child, Some(WaitPidFlag::WUNTRACED)) {
            Ok(status @ (WaitStatus::Exited(..) | WaitStatus::Signaled(..))) => {
                debug!(?status, "child terminated");
                return Ok(());
            }
            Ok(status) => trace!(?status, "child changed state"),
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                writeln!(stderr, "lsh: {}", errno.desc())?;
                return Ok(());
            }
        }
    }
}

/// Write `lsh: <error>` straight to fd 2.
///
/// Runs between fork and exec, so it must not allocate or take the
/// `stderr` lock another thread may have held at fork time.
fn report_in_child(errno: Errno) {
    let fd = io::stderr();
    for part in ["lsh: ", errno.desc(), "\n"] {
        let _ = write(fd.as_fd(), part.as_bytes());
    }
}

/// Convert the token vector into C strings for `execvp`.
///
/// Fails if a token has an interior NUL byte.
pub fn externalize(args: &[&str]) -> Result<Vec<CString>, std::ffi::NulError> {
    args.iter().map(|&arg| CString::new(arg)).collect()
}
