//! Bounded condition polling with backoff
//!
//! [`schedule`] evaluates a condition immediately and then after each delay,
//! yielding to the runtime in between. It runs the callback once the
//! condition holds, or gives up silently when a retry or elapsed-time bound is
//! exceeded. Delays are pure functions of the retry count.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use tokio::time::Instant;

/// Delay policy: retry count in, wait out.
#[derive(Clone)]
pub enum Delay {
    /// `c`
    Constant(Duration),
    /// `c * (1 + r)`
    Linear(Duration),
    /// `c * 2^r`
    Exponential(Duration),
    /// Any other pure function of the retry count
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl Delay {
    /// The wait after the `retries`-th failed poll.
    pub fn at(&self, retries: u32) -> Duration {
        match self {
            Self::Constant(base) => *base,
            Self::Linear(base) => base.saturating_mul(retries.saturating_add(1)),
            Self::Exponential(base) => match 1u32.checked_shl(retries) {
                Some(factor) => base.saturating_mul(factor),
                _ => Duration::MAX,
            },
            Self::Custom(delay) => delay(retries),
        }
    }
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(base) => f.debug_tuple("Constant").field(base).finish(),
            Self::Linear(base) => f.debug_tuple("Linear").field(base).finish(),
            Self::Exponential(base) => f.debug_tuple("Exponential").field(base).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Upper bounds on polling. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_retries: Option<u32>,
    pub max_elapsed: Option<Duration>,
}

impl Limits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn max_elapsed(mut self, elapsed: Duration) -> Self {
        self.max_elapsed = Some(elapsed);
        self
    }
}

/// A [`Backoff`] that counts retries and stops at the configured bounds.
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    delay: Delay,
    limits: Limits,
    retries: u32,
    started: Instant,
}

impl RetrySchedule {
    pub fn new(delay: Delay, limits: Limits) -> Self {
        Self {
            delay,
            limits,
            retries: 0,
            started: Instant::now(),
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    fn exhausted(&self) -> bool {
        self.limits.max_retries.is_some_and(|max| self.retries > max)
            || self
                .limits
                .max_elapsed
                .is_some_and(|max| self.started.elapsed() > max)
    }
}

impl Backoff for RetrySchedule {
    fn reset(&mut self) {
        self.retries = 0;
        self.started = Instant::now();
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.retries = self.retries.saturating_add(1);
        if self.exhausted() {
            return None;
        }
        Some(self.delay.at(self.retries))
    }
}

/// How a [`schedule`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// The condition held on the `polls`-th evaluation and the callback ran
    Satisfied { polls: u32 },
    /// A bound was exceeded after `polls` evaluations; the callback did not run
    Exhausted { polls: u32 },
}

impl ScheduleOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied { .. })
    }
}

#[derive(Debug)]
struct NotReady;

/// Poll `condition` until it holds, then run `callback`.
///
/// Neither closure is expected to fail; a panic in either is a bug, not a
/// reason to retry.
pub async fn schedule<C, F>(callback: C, mut condition: F, delay: Delay, limits: Limits) -> ScheduleOutcome
where
    C: FnOnce(),
    F: FnMut() -> bool,
{
    let mut polls = 0u32;
    let polled = backoff::future::retry(RetrySchedule::new(delay, limits), || {
        polls = polls.saturating_add(1);
        let ready = condition();
        std::future::ready(if ready {
            Ok(())
        } else {
            Err(backoff::Error::transient(NotReady))
        })
    })
    .await;

    match polled {
        Ok(()) => {
            callback();
            ScheduleOutcome::Satisfied { polls }
        }
        Err(NotReady) => ScheduleOutcome::Exhausted { polls },
    }
}
