//! Discrete simulation time.
//!
//! The canonical unit is the integer `Tick`.  Recipe step durations, delivery
//! ETAs and watchlist thresholds are all tick counts, so every comparison in
//! the engine is exact.  `SimClock` maps ticks onto wall-clock seconds for
//! logging and snapshot timestamps:
//!
//!   wall_time = start_unix_secs + tick * tick_duration_secs

use std::fmt;

use crate::{CoreError, CoreResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`, or 0 if `earlier` is later.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    #[inline]
    pub fn next(self) -> Tick {
        Tick(self.0 + 1)
    }

    /// Fraction of the span `start..end` covered at `self`, in [0, 1].  An
    /// empty span counts as complete.
    pub fn progress_between(self, start: Tick, end: Tick) -> f64 {
        let total = end.since(start);
        if total == 0 {
            return 1.0;
        }
        (self.since(start) as f64 / total as f64).min(1.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct SimClock {
    pub start_unix_secs: i64,
    pub tick_duration_secs: u32,
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(start_unix_secs: i64, tick_duration_secs: u32) -> Self {
        Self {
            start_unix_secs,
            tick_duration_secs,
            current_tick: Tick::ZERO,
        }
    }

    #[inline]
    pub fn now(&self) -> Tick {
        self.current_tick
    }

    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = self.current_tick.next();
    }

    /// Unix timestamp of an arbitrary tick.
    #[inline]
    pub fn unix_secs_at(&self, tick: Tick) -> i64 {
        self.start_unix_secs + tick.0 as i64 * self.tick_duration_secs as i64
    }

    #[inline]
    pub fn current_unix_secs(&self) -> i64 {
        self.unix_secs_at(self.current_tick)
    }

    /// Whole ticks covering `secs` seconds, rounded up.
    #[inline]
    pub fn ticks_for_secs(&self, secs: u64) -> u64 {
        secs.div_ceil(self.tick_duration_secs as u64)
    }

    /// Elapsed (hours, minutes) since tick 0, for progress logs.
    pub fn elapsed_hm(&self) -> (u64, u32) {
        let secs = self.current_tick.0 * self.tick_duration_secs as u64;
        (secs / 3_600, ((secs % 3_600) / 60) as u32)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m) = self.elapsed_hm();
        write!(f, "{} (+{}h{:02}m)", self.current_tick, h, m)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Clock and cadence settings for one run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    pub start_unix_secs: i64,
    pub tick_duration_secs: u32,
    /// Number of ticks to execute.
    pub duration_ticks: u64,
    /// Master seed for every `RngRegistry` stream.
    pub seed: u64,
    /// Snapshot every N ticks.  The final tick is always snapshotted.
    pub snapshot_interval_ticks: u64,
    /// Emit an `info!` progress line every N ticks.
    pub log_interval_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_unix_secs: 0,
            tick_duration_secs: 60,
            duration_ticks: 100,
            seed: 42,
            snapshot_interval_ticks: 60,
            log_interval_ticks: 60,
        }
    }
}

impl SimConfig {
    /// Exclusive end of the run.
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.duration_ticks)
    }

    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_unix_secs, self.tick_duration_secs)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.tick_duration_secs == 0 {
            return Err(CoreError::Config("tick_duration_secs must be > 0".into()));
        }
        if self.snapshot_interval_ticks == 0 {
            return Err(CoreError::Config("snapshot_interval_ticks must be > 0".into()));
        }
        if self.log_interval_ticks == 0 {
            return Err(CoreError::Config("log_interval_ticks must be > 0".into()));
        }
        Ok(())
    }

    /// Whether `tick` is a snapshot tick.
    #[inline]
    pub fn is_snapshot_tick(&self, tick: Tick) -> bool {
        (tick.0 + 1) % self.snapshot_interval_ticks == 0 || tick.0 + 1 == self.duration_ticks
    }
}
