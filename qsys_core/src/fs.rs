//! Best-effort filesystem shims used by the host.
//!
//! None of these report failure to the caller: a missing file is `None`, a directory
//! that cannot be created or a log line that cannot be written is dropped with a
//! debug-level log record.

use std::fmt;
use std::fs::{self, DirBuilder, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, MetadataExt, OpenOptionsExt};
use std::path::Path;

use log::debug;

/// Last-modified time in seconds since the Unix epoch, or `None` if `path` cannot be
/// stat'ed.
pub fn file_time(path: impl AsRef<Path>) -> Option<i64> {
    fs::metadata(path.as_ref()).ok().map(|m| m.mtime())
}

/// Creates `path` with mode 0777 (before umask). Already-existing paths and other
/// failures are ignored.
pub fn make_dir(path: impl AsRef<Path>) {
    let path = path.as_ref();
    if let Err(e) = DirBuilder::new().mode(0o777).create(path) {
        debug!("mkdir {} ignored: {e}", path.display());
    }
}

/// Appends the formatted text to `path` in one open/write/close cycle.
///
/// The file is created with mode 0666 when absent. Nothing is buffered between calls,
/// so concurrent writers interleave at write granularity.
pub fn debug_log(path: impl AsRef<Path>, args: fmt::Arguments<'_>) {
    let path = path.as_ref();
    let data = fmt::format(args);

    let res = OpenOptions::new()
        .append(true)
        .create(true)
        .mode(0o666)
        .open(path)
        .and_then(|mut f| f.write_all(data.as_bytes()));

    if let Err(e) = res {
        debug!("debug log {} dropped: {e}", path.display());
    }
}

/// `debug_log!(path, "fmt", args..)`
#[macro_export]
macro_rules! debug_log {
    ($path:expr, $($arg:tt)*) => {
        $crate::fs::debug_log($path, format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_time_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(file_time(dir.path().join("pak9.pak")), None);
    }

    #[test]
    fn test_existing_file_time_is_recent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.cfg");
        fs::write(&path, "bind w +forward\n").unwrap();
        let t = file_time(&path).unwrap();
        assert!(t > 1_000_000_000);
    }

    #[test]
    fn test_make_dir_twice_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("id1");
        make_dir(&sub);
        make_dir(&sub);
        assert!(sub.is_dir());
    }

    #[test]
    fn test_make_dir_without_parent_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("a").join("b");
        make_dir(&deep);
        assert!(!deep.exists());
    }

    #[test]
    fn test_debug_log_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        crate::debug_log!(&path, "frame {}\n", 1);
        crate::debug_log!(&path, "frame {}\n", 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "frame 1\nframe 2\n");
    }

    #[test]
    fn test_debug_log_into_missing_dir_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        debug_log(dir.path().join("nope").join("x.log"), format_args!("lost"));
    }
}
