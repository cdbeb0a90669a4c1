use std::fmt;

use crate::{console::ConsoleOut, time::Time};

/// Everything a host can touch while one frame is being processed.
pub struct FrameContext<'a> {
    pub console: &'a mut ConsoleOut,
    pub time: &'a Time,
    pub quit_requested: &'a mut bool,
}

impl FrameContext<'_> {
    /// Seconds this frame represents.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.time.frame_sec
    }

    #[inline]
    pub fn print(&mut self, args: fmt::Arguments<'_>) {
        self.console.emit_fmt(args);
    }

    /// Ends the main loop through the quit path once the current call returns.
    #[inline]
    pub fn request_quit(&mut self) {
        *self.quit_requested = true;
    }
}
