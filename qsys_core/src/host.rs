use crate::error::SysResult;
use crate::frame::FrameContext;

/// Execution mode, owned by the host and re-read every loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    /// Free-running: a frame is dispatched every iteration.
    #[default]
    Interactive,
    /// Headless server: frames are paced to exactly one tic each.
    Dedicated,
}

/// The simulation host driven by [`crate::scheduler::MainLoop`].
///
/// Any `Err` returned from `command` or `frame` is fatal: the loop routes it through
/// the lifecycle fatal path and stops. Hosts request a clean exit with
/// [`FrameContext::request_quit`].
pub trait Host {
    fn id(&self) -> &'static str;

    fn mode(&self) -> ExecMode;

    /// Tic length in seconds. Minimum frame spacing in dedicated mode, stall threshold
    /// reference in both modes.
    fn tick_rate(&self) -> f64;

    /// One console line typed on stdin (dedicated mode only).
    fn command(&mut self, _line: &str, _ctx: &mut FrameContext<'_>) -> SysResult<()> {
        Ok(())
    }

    fn frame(&mut self, ctx: &mut FrameContext<'_>) -> SysResult<()>;

    /// Called at most once, from either termination path. May run before the host was
    /// ever initialized.
    fn shutdown(&mut self) {}
}
