use std::io;
use std::os::fd::RawFd;

/// Blocking-mode control for the process's standard input.
pub trait DescriptorMode {
    fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()>;
}

/// `fcntl`-backed blocking-mode control, `STDIN_FILENO` unless told otherwise.
#[derive(Debug, Clone, Copy)]
pub struct StdinDescriptor {
    fd: RawFd,
}

impl StdinDescriptor {
    #[inline]
    pub fn with_fd(fd: RawFd) -> Self {
        Self { fd }
    }

    #[inline]
    pub fn fd(&self) -> RawFd {
        self.fd
    }
}

impl Default for StdinDescriptor {
    fn default() -> Self {
        Self::with_fd(libc::STDIN_FILENO)
    }
}

impl DescriptorMode for StdinDescriptor {
    fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()> {
        // SAFETY: F_GETFL/F_SETFL on a descriptor we do not own; no memory is passed.
        let flags = unsafe { libc::fcntl(self.fd, libc::F_GETFL, 0) };
        if flags == -1 {
            return Err(io::Error::last_os_error());
        }

        let next = if nonblocking {
            flags | libc::O_NONBLOCK
        } else {
            flags & !libc::O_NONBLOCK
        };
        if next == flags {
            return Ok(());
        }

        // SAFETY: see above.
        if unsafe { libc::fcntl(self.fd, libc::F_SETFL, next) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::args::IoFlags;
    use crate::lifecycle::Lifecycle;
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

    /// `(read end, write end)` of a fresh pipe, closed on drop.
    pub(crate) fn pipe() -> (OwnedFd, OwnedFd) {
        let mut fds = [0 as RawFd; 2];
        // SAFETY: `fds` has room for the two descriptors pipe(2) writes.
        let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
        assert_eq!(rc, 0, "pipe: {}", io::Error::last_os_error());
        // SAFETY: both descriptors were just created and are owned by nobody else.
        unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
    }

    fn is_nonblocking(fd: RawFd) -> bool {
        // SAFETY: F_GETFL only reads descriptor flags.
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL, 0) };
        assert_ne!(flags, -1);
        flags & libc::O_NONBLOCK != 0
    }

    #[test]
    fn test_default_targets_stdin() {
        assert_eq!(StdinDescriptor::default().fd(), libc::STDIN_FILENO);
    }

    #[test]
    fn test_nonblocking_bit_round_trips() {
        let (rx, _tx) = pipe();
        let mut desc = StdinDescriptor::with_fd(rx.as_raw_fd());
        assert!(!is_nonblocking(rx.as_raw_fd()));

        desc.set_nonblocking(true).unwrap();
        assert!(is_nonblocking(rx.as_raw_fd()));
        desc.set_nonblocking(true).unwrap();
        assert!(is_nonblocking(rx.as_raw_fd()));

        desc.set_nonblocking(false).unwrap();
        assert!(!is_nonblocking(rx.as_raw_fd()));
    }

    #[test]
    fn test_bad_descriptor_reports_error() {
        assert!(StdinDescriptor::with_fd(-1).set_nonblocking(true).is_err());
    }

    #[test]
    fn test_lifecycle_fatal_restores_real_descriptor() {
        let (rx, _tx) = pipe();
        let fd = rx.as_raw_fd();
        let mut lc = Lifecycle::with_error_stream(
            Box::new(StdinDescriptor::with_fd(fd)),
            Box::new(io::sink()),
        );

        lc.init(IoFlags::default()).unwrap();
        assert!(is_nonblocking(fd));

        let mut host = crate::lifecycle::tests::CountingHost::default();
        lc.fatal(&mut host, "Host_Error: server crashed");
        assert!(!is_nonblocking(fd));
        assert_eq!(host.shutdowns, 1);
    }

    #[test]
    fn test_lifecycle_drop_restores_real_descriptor() {
        let (rx, _tx) = pipe();
        let fd = rx.as_raw_fd();
        {
            let mut lc = Lifecycle::with_error_stream(
                Box::new(StdinDescriptor::with_fd(fd)),
                Box::new(io::sink()),
            );
            lc.init(IoFlags::default()).unwrap();
            assert!(is_nonblocking(fd));
        }
        assert!(!is_nonblocking(fd));
    }
}
