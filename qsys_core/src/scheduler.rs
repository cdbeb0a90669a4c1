//! Frame scheduler (main loop).
//!
//! Each iteration reads the clock and asks the [`FramePacer`] whether a frame is due.
//! In dedicated mode a frame runs only once a full tic has passed, and it is always
//! exactly one tic long. In interactive mode every iteration runs a frame with the real
//! elapsed time. In both modes a gap longer than `STALL_FACTOR` tics resynchronizes the
//! frame clock instead of replaying the backlog.

use std::thread;
use std::time::Duration;

use log::{debug, error, info};

use crate::config::FrameConfig;
use crate::context::SysContext;
use crate::error::SysResult;
use crate::frame::FrameContext;
use crate::host::{ExecMode, Host};
use crate::lifecycle::Termination;
use crate::signals::ExitSignal;
use crate::time::{Clock, Time};

/// A gap longer than this many tics is treated as a stall (debugger, suspend) and the
/// backlog is dropped.
pub const STALL_FACTOR: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pace {
    /// Tic not yet due; yield and poll again.
    Wait,
    /// Dispatch a frame of this many seconds.
    Run(f64),
}

/// The accumulated frame clock.
#[derive(Debug, Clone)]
pub struct FramePacer {
    last_frame_start: f64,
    resyncs: u64,
}

impl FramePacer {
    /// `bias` is subtracted from `now` so the first frame reports a small non-zero time.
    #[inline]
    pub fn new(now: f64, bias: f64) -> Self {
        Self {
            last_frame_start: now - bias,
            resyncs: 0,
        }
    }

    #[inline]
    pub fn last_frame_start(&self) -> f64 {
        self.last_frame_start
    }

    /// Number of stalls that reset the frame clock so far.
    #[inline]
    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }

    pub fn advance(&mut self, t_now: f64, mode: ExecMode, tick_rate: f64) -> Pace {
        let elapsed = t_now - self.last_frame_start;

        let frame = match mode {
            ExecMode::Dedicated if elapsed < tick_rate => return Pace::Wait,
            ExecMode::Dedicated => tick_rate,
            ExecMode::Interactive => elapsed,
        };

        if elapsed > tick_rate * STALL_FACTOR {
            self.last_frame_start = t_now;
            self.resyncs += 1;
        } else {
            // Accumulate what was dispatched so the sub-tic remainder carries over.
            self.last_frame_start += frame;
        }

        Pace::Run(frame)
    }
}

/// Non-finite or negative tick rates are read as zero.
#[inline]
fn sanitize_tick_rate(rate: f64) -> f64 {
    if rate.is_finite() && rate > 0.0 {
        rate
    } else {
        0.0
    }
}

/// Result of one loop iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue,
    Terminate(Termination),
}

pub struct MainLoop<C: Clock> {
    clock: C,
    pacer: FramePacer,
    time: Time,
    idle_sleep: Duration,
    max_console_lines: usize,
    exit_signal: Option<ExitSignal>,
}

impl<C: Clock> MainLoop<C> {
    pub fn new(mut clock: C, cfg: &FrameConfig) -> Self {
        let now = clock.now();
        Self {
            clock,
            pacer: FramePacer::new(now, cfg.initial_bias_sec),
            time: Time::new(0.0),
            idle_sleep: Duration::from_micros(cfg.idle_sleep_us),
            max_console_lines: cfg.max_console_lines,
            exit_signal: None,
        }
    }

    #[inline]
    pub fn with_exit_signal(mut self, signal: ExitSignal) -> Self {
        self.exit_signal = Some(signal);
        self
    }

    #[inline]
    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    /// Runs until the host quits, escalates an error, or the exit signal fires.
    pub fn run(&mut self, host: &mut dyn Host, sys: &mut SysContext) -> Termination {
        if !sys.lifecycle.is_running() {
            return sys.fatal(host, "main loop entered before lifecycle init");
        }

        info!("main loop: host '{}' mode {:?}", host.id(), host.mode());
        loop {
            if let Step::Terminate(t) = self.step(host, sys) {
                return t;
            }
        }
    }

    pub fn step(&mut self, host: &mut dyn Host, sys: &mut SysContext) -> Step {
        if self
            .exit_signal
            .as_ref()
            .is_some_and(ExitSignal::is_exit_requested)
        {
            return Step::Terminate(sys.quit(host));
        }

        let t_now = self.clock.now();
        let mode = host.mode();
        let tick_rate = sanitize_tick_rate(host.tick_rate());

        let resyncs = self.pacer.resyncs();
        let frame_sec = match self.pacer.advance(t_now, mode, tick_rate) {
            Pace::Wait => {
                self.idle();
                return Step::Continue;
            }
            Pace::Run(frame_sec) => frame_sec,
        };
        if self.pacer.resyncs() != resyncs {
            debug!("frame clock resynced at t={t_now:.3} (stall)");
        }

        self.time.begin_frame(frame_sec, t_now, tick_rate);

        let mut quit = false;
        match self.dispatch(host, sys, mode, &mut quit) {
            Err(e) => {
                error!("host '{}': {e}", host.id());
                Step::Terminate(sys.fatal(host, &e.to_string()))
            }
            Ok(()) if quit => Step::Terminate(sys.quit(host)),
            Ok(()) => Step::Continue,
        }
    }

    /// Feeds up to `max_console_lines` pending console lines to the host, then runs its
    /// frame. A quit requested by a console command skips the frame.
    fn dispatch(
        &mut self,
        host: &mut dyn Host,
        sys: &mut SysContext,
        mode: ExecMode,
        quit: &mut bool,
    ) -> SysResult<()> {
        let mut ctx = FrameContext {
            console: &mut sys.output,
            time: &self.time,
            quit_requested: quit,
        };

        for _ in 0..self.max_console_lines {
            let Some(line) = sys.input.poll_line(mode) else {
                break;
            };
            host.command(&line, &mut ctx)?;
            if *ctx.quit_requested {
                return Ok(());
            }
        }

        host.frame(&mut ctx)
    }

    #[inline]
    fn idle(&self) {
        if self.idle_sleep.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(self.idle_sleep);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: ExecMode = ExecMode::Dedicated;
    const I: ExecMode = ExecMode::Interactive;

    #[test]
    fn test_first_frame_is_biased() {
        let mut pacer = FramePacer::new(5.0, 0.1);
        let Pace::Run(dt) = pacer.advance(5.0, I, 0.05) else {
            panic!("interactive frames always run");
        };
        assert!((dt - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_dedicated_waits_for_a_full_tic() {
        let mut pacer = FramePacer::new(0.1, 0.1);
        assert_eq!(pacer.advance(0.05, D, 0.1), Pace::Wait);
        assert_eq!(pacer.advance(0.06, D, 0.1), Pace::Wait);
        assert_eq!(pacer.advance(0.12, D, 0.1), Pace::Run(0.1));
        assert_eq!(pacer.last_frame_start(), 0.1);
    }

    #[test]
    fn test_wait_does_not_move_frame_clock() {
        let mut pacer = FramePacer::new(1.0, 0.0);
        pacer.advance(1.01, D, 0.1);
        assert_eq!(pacer.last_frame_start(), 1.0);
    }

    #[test]
    fn test_dedicated_keeps_sub_tic_remainder() {
        let mut pacer = FramePacer::new(0.0, 0.0);
        assert_eq!(pacer.advance(0.375, D, 0.25), Pace::Run(0.25));
        assert_eq!(pacer.last_frame_start(), 0.25);
        // 0.125 of the first gap carried over, so the next tic is due at 0.5.
        assert_eq!(pacer.advance(0.5, D, 0.25), Pace::Run(0.25));
    }

    #[test]
    fn test_long_run_rate_matches_target() {
        let mut pacer = FramePacer::new(0.0, 0.0);
        let mut runs = 0;
        for k in 1..=160 {
            let t = f64::from(k) * 0.1875;
            if let Pace::Run(dt) = pacer.advance(t, D, 0.25) {
                assert_eq!(dt, 0.25);
                runs += 1;
            }
        }
        assert_eq!(runs, 120);
        assert_eq!(pacer.resyncs(), 0);
    }

    #[test]
    fn test_stall_resyncs_without_catch_up_burst() {
        let mut pacer = FramePacer::new(0.0, 0.0);
        assert_eq!(pacer.advance(0.5, D, 0.1), Pace::Run(0.1));
        assert_eq!(pacer.resyncs(), 1);
        assert_eq!(pacer.last_frame_start(), 0.5);
        for _ in 0..5 {
            assert_eq!(pacer.advance(0.5, D, 0.1), Pace::Wait);
        }
    }

    #[test]
    fn test_interactive_stall_resyncs() {
        let mut pacer = FramePacer::new(0.0, 0.0);
        assert_eq!(pacer.advance(0.5, I, 0.1), Pace::Run(0.5));
        assert_eq!(pacer.resyncs(), 1);
        let Pace::Run(next) = pacer.advance(0.5625, I, 0.1) else {
            panic!("interactive frames always run");
        };
        assert_eq!(next, 0.0625);
    }

    #[test]
    fn test_exactly_two_tics_is_not_a_stall() {
        let mut pacer = FramePacer::new(0.0, 0.0);
        assert_eq!(pacer.advance(0.5, D, 0.25), Pace::Run(0.25));
        assert_eq!(pacer.resyncs(), 0);
        assert_eq!(pacer.last_frame_start(), 0.25);
    }

    #[test]
    fn test_interactive_runs_every_iteration() {
        let mut pacer = FramePacer::new(0.0, 0.0);
        assert_eq!(pacer.advance(0.0, I, 0.1), Pace::Run(0.0));
        assert_eq!(pacer.advance(0.0625, I, 0.1), Pace::Run(0.0625));
        assert_eq!(pacer.last_frame_start(), 0.0625);
    }

    #[test]
    fn test_bad_tick_rates_read_as_zero() {
        assert_eq!(sanitize_tick_rate(f64::NAN), 0.0);
        assert_eq!(sanitize_tick_rate(f64::INFINITY), 0.0);
        assert_eq!(sanitize_tick_rate(-0.1), 0.0);
        assert_eq!(sanitize_tick_rate(0.05), 0.05);
    }
}
