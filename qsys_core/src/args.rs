use std::path::PathBuf;

use crate::error::{SysError, SysResult};

/// Console I/O switches fixed once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoFlags {
    /// `-nostdout`: console output is dropped.
    pub nostdout: bool,
    /// `-noconinput`: stdin is never made non-blocking nor polled.
    pub noconinput: bool,
}

/// Read-only view of the process arguments, `argv[0]` included.
#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    argv: Vec<String>,
}

impl CommandLine {
    #[inline]
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    #[inline]
    pub fn from_env() -> Self {
        Self::new(std::env::args().collect())
    }

    #[inline]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Position of `parm` in argv, never matching `argv[0]`.
    pub fn check_parm(&self, parm: &str) -> Option<usize> {
        self.argv
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, a)| a.as_str() == parm)
            .map(|(i, _)| i)
    }

    /// The argument following `parm`, if both exist.
    pub fn value_of(&self, parm: &str) -> Option<&str> {
        let i = self.check_parm(parm)?;
        self.argv.get(i + 1).map(String::as_str)
    }

    pub fn io_flags(&self) -> IoFlags {
        IoFlags {
            nostdout: self.check_parm("-nostdout").is_some(),
            noconinput: self.check_parm("-noconinput").is_some(),
        }
    }
}

/// Startup parameters handed to the host: base directory, arguments and its
/// preallocated heap.
pub struct HostParms {
    pub basedir: PathBuf,
    pub argv: Vec<String>,
    pub heap: Vec<u8>,
}

impl HostParms {
    /// Allocates a zeroed `memsize`-byte heap. A refused reservation is fatal for the
    /// caller.
    ///
    /// The zeroed buffer comes straight from the allocator, so its pages are not touched
    /// until the host uses them.
    pub fn allocate(
        basedir: impl Into<PathBuf>,
        argv: &[String],
        memsize: usize,
    ) -> SysResult<Self> {
        let mut probe = Vec::<u8>::new();
        probe
            .try_reserve_exact(memsize)
            .map_err(|_| SysError::fatal(format!("Allocation of {memsize} byte heap failed")))?;
        drop(probe);
        let heap = vec![0u8; memsize];

        Ok(Self {
            basedir: basedir.into(),
            argv: argv.to_vec(),
            heap,
        })
    }

    #[inline]
    pub fn memsize(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmdline(args: &[&str]) -> CommandLine {
        CommandLine::new(args.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_check_parm_skips_program_name() {
        let cl = cmdline(&["-dedicated", "+map", "-dedicated"]);
        assert_eq!(cl.check_parm("-dedicated"), Some(2));
        assert_eq!(cl.check_parm("-nostdout"), None);
    }

    #[test]
    fn test_value_of() {
        let cl = cmdline(&["qsys", "-config", "server.toml", "-ticrate"]);
        assert_eq!(cl.value_of("-config"), Some("server.toml"));
        assert_eq!(cl.value_of("-ticrate"), None);
    }

    #[test]
    fn test_io_flags() {
        let cl = cmdline(&["qsys", "-noconinput"]);
        assert_eq!(
            cl.io_flags(),
            IoFlags {
                nostdout: false,
                noconinput: true
            }
        );
    }

    #[test]
    fn test_heap_allocation() {
        let parms = HostParms::allocate(".", &[], 4096).unwrap();
        assert_eq!(parms.memsize(), 4096);
    }

    #[test]
    fn test_impossible_heap_is_an_error() {
        let Err(e) = HostParms::allocate(".", &[], usize::MAX) else {
            panic!("usize::MAX heap allocated");
        };
        assert_eq!(
            e.to_string(),
            format!("Allocation of {} byte heap failed", usize::MAX)
        );
    }

    #[cfg(target_os = "linux")]
    fn resident_bytes() -> usize {
        let statm = std::fs::read_to_string("/proc/self/statm").unwrap();
        let pages: usize = statm.split_whitespace().nth(1).unwrap().parse().unwrap();
        // SAFETY: sysconf has no preconditions.
        let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        pages * page
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_heap_pages_are_not_touched_up_front() {
        const MEMSIZE: usize = 256 * 1024 * 1024;
        let before = resident_bytes();
        let parms = HostParms::allocate(".", &[], MEMSIZE).unwrap();
        let after = resident_bytes();

        assert_eq!(parms.memsize(), MEMSIZE);
        assert!(
            after.saturating_sub(before) < MEMSIZE / 2,
            "heap committed {} bytes up front",
            after.saturating_sub(before)
        );
        assert_eq!(parms.heap[MEMSIZE - 1], 0);
    }
}
