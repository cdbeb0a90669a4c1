use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Elapsed-time source read once per main-loop iteration.
pub trait Clock {
    /// Seconds since the clock's epoch.
    fn now(&mut self) -> f64;
}

/// Wall-clock time rebased to the first query.
///
/// The first call stores the current whole second as the epoch and returns only the
/// sub-second part. Every later call returns `(secs - epoch) + fraction`. The epoch is
/// never moved again; if the OS clock is stepped backwards the result goes backwards too.
#[derive(Debug, Default)]
pub struct SystemClock {
    epoch_secs: Option<u64>,
}

impl SystemClock {
    #[inline]
    pub fn new() -> Self {
        Self { epoch_secs: None }
    }

    #[inline]
    pub fn epoch_secs(&self) -> Option<u64> {
        self.epoch_secs
    }

    fn wall() -> (u64, f64) {
        let d = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        (d.as_secs(), f64::from(d.subsec_micros()) / 1_000_000.0)
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> f64 {
        let (secs, frac) = Self::wall();
        match self.epoch_secs {
            None => {
                self.epoch_secs = Some(secs);
                frac
            }
            Some(base) => (secs as i64 - base as i64) as f64 + frac,
        }
    }
}

/// Hand-driven clock. Clones share the same reading, so a host can advance time from
/// inside its own frame.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    t: Rc<Cell<f64>>,
}

impl ManualClock {
    #[inline]
    pub fn new(start: f64) -> Self {
        Self {
            t: Rc::new(Cell::new(start)),
        }
    }

    #[inline]
    pub fn set(&self, t: f64) {
        self.t.set(t);
    }

    #[inline]
    pub fn advance(&self, dt: f64) {
        self.t.set(self.t.get() + dt);
    }

    #[inline]
    pub fn get(&self) -> f64 {
        self.t.get()
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&mut self) -> f64 {
        self.t.get()
    }
}

/// Frame timing handed to the host with every dispatched frame.
#[derive(Debug, Clone)]
pub struct Time {
    /// Seconds this frame represents (exactly the tick rate in dedicated mode).
    pub frame_sec: f64,
    /// Clock reading taken at the start of the frame.
    pub realtime: f64,
    pub frame_index: u64,
    pub tick_rate: f64,
}

impl Time {
    pub fn new(tick_rate: f64) -> Self {
        Self {
            frame_sec: 0.0,
            realtime: 0.0,
            frame_index: 0,
            tick_rate,
        }
    }

    #[inline]
    pub(crate) fn begin_frame(&mut self, frame_sec: f64, realtime: f64, tick_rate: f64) {
        self.frame_sec = frame_sec;
        self.realtime = realtime;
        self.tick_rate = tick_rate;
        self.frame_index += 1;
    }
}

/// Idle for one millisecond.
///
/// `thread::sleep` already resumes after signal interruptions.
pub fn sleep() {
    thread::sleep(Duration::from_millis(1));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_reading_is_subsecond_fraction() {
        let mut clock = SystemClock::new();
        let t0 = clock.now();
        assert!((0.0..1.0).contains(&t0));
        assert!(clock.epoch_secs().is_some());
    }

    #[test]
    fn test_epoch_is_fixed_after_first_call() {
        let mut clock = SystemClock::new();
        clock.now();
        let epoch = clock.epoch_secs();
        sleep();
        clock.now();
        assert_eq!(clock.epoch_secs(), epoch);
    }

    #[test]
    fn test_readings_are_non_decreasing() {
        let mut clock = SystemClock::new();
        let mut prev = clock.now();
        for _ in 0..200 {
            let t = clock.now();
            assert!(t >= prev, "{t} < {prev}");
            prev = t;
        }
    }

    #[test]
    fn test_manual_clock_clones_share_reading() {
        let mut clock = ManualClock::new(1.0);
        let handle = clock.clone();
        handle.advance(0.25);
        assert_eq!(clock.now(), 1.25);
        handle.set(3.0);
        assert_eq!(clock.now(), 3.0);
    }

    #[test]
    fn test_begin_frame_counts() {
        let mut time = Time::new(0.05);
        time.begin_frame(0.05, 1.0, 0.05);
        time.begin_frame(0.05, 1.05, 0.05);
        assert_eq!(time.frame_index, 2);
        assert_eq!(time.realtime, 1.05);
    }
}
