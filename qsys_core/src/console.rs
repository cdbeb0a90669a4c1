//! Console I/O bridge.
//!
//! Outbound text is filtered so that only tab, newline, carriage return and printable
//! ASCII reach the terminal; every other byte is written as a `[xx]` hex escape.
//! Inbound text is polled from stdin without ever blocking the main loop.

use std::fmt;
use std::io::{self, Write};
use std::os::fd::RawFd;

use log::debug;

use crate::host::ExecMode;

/// Default size of a single stdin read.
pub const READ_CHUNK: usize = 256;

const HEX: &[u8; 16] = b"0123456789abcdef";

#[inline]
fn passes_through(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\r' | 0x20..=0x7e)
}

/// Appends `text` to `out`, escaping every byte that is not safe for a terminal.
pub fn sanitize_into(out: &mut Vec<u8>, text: &[u8]) {
    for &b in text {
        if passes_through(b) {
            out.push(b);
        } else {
            out.extend_from_slice(&[
                b'[',
                HEX[usize::from(b >> 4)],
                HEX[usize::from(b & 0x0f)],
                b']',
            ]);
        }
    }
}

pub fn sanitize(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    sanitize_into(&mut out, text);
    out
}

/// Sanitizing console writer (stdout in production).
pub struct ConsoleOut {
    out: Box<dyn Write>,
    suppressed: bool,
    scratch: Vec<u8>,
}

impl ConsoleOut {
    pub fn new(out: Box<dyn Write>, suppressed: bool) -> Self {
        Self {
            out,
            suppressed,
            scratch: Vec::new(),
        }
    }

    #[inline]
    pub fn stdout(suppressed: bool) -> Self {
        Self::new(Box::new(io::stdout()), suppressed)
    }

    pub fn emit(&mut self, text: impl AsRef<[u8]>) {
        if self.suppressed {
            return;
        }

        self.scratch.clear();
        sanitize_into(&mut self.scratch, text.as_ref());
        if let Err(e) = self.out.write_all(&self.scratch) {
            debug!("console write failed: {e}");
        }
    }

    /// `printf`-style entry point, use with `format_args!`.
    pub fn emit_fmt(&mut self, args: fmt::Arguments<'_>) {
        if self.suppressed {
            return;
        }
        match args.as_str() {
            Some(s) => self.emit(s),
            None => self.emit(args.to_string()),
        }
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.out.flush() {
            debug!("console flush failed: {e}");
        }
    }
}

/// Non-blocking byte source behind [`ConsoleIn`].
pub trait InputSource {
    /// Zero-timeout readiness probe. Must never block.
    fn ready(&mut self) -> bool;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Raw stdin, bypassing std's internal buffering so the readiness probe stays accurate.
#[derive(Debug, Clone, Copy)]
pub struct StdinSource {
    fd: RawFd,
}

impl StdinSource {
    #[inline]
    pub fn with_fd(fd: RawFd) -> Self {
        Self { fd }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::with_fd(libc::STDIN_FILENO)
    }
}

impl InputSource for StdinSource {
    /// Readable data or a hung-up writer both count as ready; the following read
    /// returns the data or end of file.
    fn ready(&mut self) -> bool {
        let mut pfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: one valid pollfd, zero timeout.
        let rc = unsafe { libc::poll(&mut pfd, 1, 0) };
        rc > 0 && (pfd.revents & (libc::POLLIN | libc::POLLHUP)) != 0
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: `buf` is valid for `buf.len()` writable bytes.
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }
}

/// Line poller for dedicated-mode console commands.
pub struct ConsoleIn {
    source: Box<dyn InputSource>,
    disabled: bool,
    pending: Vec<u8>,
    chunk: Vec<u8>,
}

impl ConsoleIn {
    pub fn new(source: Box<dyn InputSource>, disabled: bool, read_chunk: usize) -> Self {
        Self {
            source,
            disabled,
            pending: Vec::new(),
            chunk: vec![0; read_chunk.max(1)],
        }
    }

    #[inline]
    pub fn stdin(disabled: bool, read_chunk: usize) -> Self {
        Self::new(Box::new(StdinSource::default()), disabled, read_chunk)
    }

    /// Returns at most one completed line, without its terminator.
    ///
    /// Always `None` outside dedicated mode or when input polling was disabled at
    /// startup. Lines already buffered are handed out before stdin is probed again.
    /// A partial line is held until its newline arrives, unless it outgrows the read
    /// chunk or stdin reaches end of file, in which case it is returned as is.
    pub fn poll_line(&mut self, mode: ExecMode) -> Option<String> {
        if self.disabled || mode != ExecMode::Dedicated {
            return None;
        }

        if let Some(line) = self.take_line() {
            return Some(line);
        }

        if !self.source.ready() {
            return None;
        }

        let n = match self.source.read(&mut self.chunk) {
            Ok(n) => n,
            Err(e) => {
                debug!("stdin read failed: {e}");
                return None;
            }
        };

        if n < 1 {
            return self.take_rest();
        }

        self.pending.extend_from_slice(&self.chunk[..n]);
        if let Some(line) = self.take_line() {
            return Some(line);
        }
        if self.pending.len() >= self.chunk.len() {
            return self.take_rest();
        }
        None
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let rest = self.pending.split_off(end + 1);
        let mut line = std::mem::replace(&mut self.pending, rest);
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn take_rest(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}
