//! Process lifecycle: startup, clean quit, fatal termination.
//!
//! `Uninitialized -> Running -> {TerminatingNormal, TerminatingFatal}`
//!
//! Neither termination path exits the process here. Both return a [`Termination`] that
//! the binary turns into an exit status. Before returning, the fatal and quit paths
//! have already restored stdin to blocking mode and shut the host down (once). `Drop`
//! restores stdin as a last resort, e.g. while unwinding from a panic.

use std::io::{self, Write};

use log::{debug, info, warn};

use crate::args::IoFlags;
use crate::console::ConsoleOut;
use crate::error::{SysError, SysResult};
use crate::host::Host;
use crate::stdin::DescriptorMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Running,
    TerminatingNormal,
    TerminatingFatal,
}

/// How the process ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Quit,
    Fatal(String),
}

impl Termination {
    #[inline]
    pub fn exit_code(&self) -> i32 {
        match self {
            Termination::Quit => 0,
            Termination::Fatal(_) => 1,
        }
    }
}

pub struct Lifecycle {
    state: LifecycleState,
    stdin: Box<dyn DescriptorMode>,
    stdin_nonblocking: bool,
    host_shut_down: bool,
    err: Box<dyn Write>,
}

impl Lifecycle {
    #[inline]
    pub fn new(stdin: Box<dyn DescriptorMode>) -> Self {
        Self::with_error_stream(stdin, Box::new(io::stderr()))
    }

    pub fn with_error_stream(stdin: Box<dyn DescriptorMode>, err: Box<dyn Write>) -> Self {
        Self {
            state: LifecycleState::Uninitialized,
            stdin,
            stdin_nonblocking: false,
            host_shut_down: false,
            err,
        }
    }

    #[inline]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    /// One-time platform setup. Must run before the main loop starts.
    pub fn init(&mut self, flags: IoFlags) -> SysResult<()> {
        if self.state != LifecycleState::Uninitialized {
            return Err(SysError::fatal(format!(
                "lifecycle init called in state {:?}",
                self.state
            )));
        }

        mask_fp_exceptions();
        set_fpcw();

        if !flags.noconinput {
            match self.stdin.set_nonblocking(true) {
                Ok(()) => self.stdin_nonblocking = true,
                Err(e) => warn!("stdin stays blocking: {e}"),
            }
        }

        self.state = LifecycleState::Running;
        debug!(
            "lifecycle running (nostdout={}, noconinput={})",
            flags.nostdout, flags.noconinput
        );
        Ok(())
    }

    /// Unrecoverable error path.
    ///
    /// Restores stdin, prints `Error: <message>` to the error stream, shuts the host
    /// down (at most once per lifetime) and reports exit status 1. Valid from any state,
    /// including before `init`.
    pub fn fatal(&mut self, host: &mut dyn Host, message: &str) -> Termination {
        self.restore_stdin();

        let _ = writeln!(self.err, "Error: {message}");
        let _ = self.err.flush();

        self.state = LifecycleState::TerminatingFatal;
        self.shutdown_host(host);
        Termination::Fatal(message.to_string())
    }

    /// Clean, user-requested exit.
    pub fn quit(&mut self, host: &mut dyn Host, console: &mut ConsoleOut) -> Termination {
        self.shutdown_host(host);
        self.restore_stdin();
        console.flush();

        self.state = LifecycleState::TerminatingNormal;
        info!("quit");
        Termination::Quit
    }

    fn shutdown_host(&mut self, host: &mut dyn Host) {
        if self.host_shut_down {
            return;
        }
        self.host_shut_down = true;
        debug!("host '{}' shutdown", host.id());
        host.shutdown();
    }

    fn restore_stdin(&mut self) {
        if !self.stdin_nonblocking {
            return;
        }
        match self.stdin.set_nonblocking(false) {
            Ok(()) => self.stdin_nonblocking = false,
            Err(e) => warn!("failed to restore blocking stdin: {e}"),
        }
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        self.restore_stdin();
    }
}

/// SIGFPE is ignored for the whole process so arithmetic faults degrade to IEEE results.
fn mask_fp_exceptions() {
    // SAFETY: installing SIG_IGN has no handler code to run.
    unsafe {
        libc::signal(libc::SIGFPE, libc::SIG_IGN);
    }
}

/// Floating-point control word setup. Nothing to do on this platform.
#[inline]
pub fn set_fpcw() {}
