use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::error::{SysError, SysResult};

/// Quit request raised from outside the main loop (Ctrl-C).
///
/// The loop polls it once per iteration and, when set, takes the normal quit path.
#[derive(Clone, Default)]
pub struct ExitSignal {
    flag: Arc<AtomicBool>,
}

impl ExitSignal {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    #[inline]
    pub fn request_exit(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_exit_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn install_ctrlc_handler(&self) -> SysResult<()> {
        let s = self.clone();
        ctrlc::set_handler(move || s.request_exit())
            .map_err(|e| SysError::fatal(format!("ctrl-c handler: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let a = ExitSignal::new();
        let b = a.clone();
        assert!(!b.is_exit_requested());
        a.request_exit();
        assert!(b.is_exit_requested());
    }
}
