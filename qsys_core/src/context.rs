use crate::console::{ConsoleIn, ConsoleOut};
use crate::host::Host;
use crate::lifecycle::{Lifecycle, Termination};

/// Process-wide platform state, built once at startup and lent to the main loop.
pub struct SysContext {
    pub lifecycle: Lifecycle,
    pub output: ConsoleOut,
    pub input: ConsoleIn,
}

impl SysContext {
    #[inline]
    pub fn new(lifecycle: Lifecycle, output: ConsoleOut, input: ConsoleIn) -> Self {
        Self {
            lifecycle,
            output,
            input,
        }
    }

    #[inline]
    pub fn fatal(&mut self, host: &mut dyn Host, message: &str) -> Termination {
        self.lifecycle.fatal(host, message)
    }

    #[inline]
    pub fn quit(&mut self, host: &mut dyn Host) -> Termination {
        self.lifecycle.quit(host, &mut self.output)
    }
}
