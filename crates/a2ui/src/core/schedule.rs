use std::{cmp::Ordering, collections::BinaryHeap, time::Duration};

use tokio::time::Instant;

/// What a session wakes up to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Send a keepalive frame.
    Keepalive,
    /// Advance the temporal driver.
    Tick,
}

/// A scheduled wake-up.
#[derive(Debug)]
struct Pending {
    /// Scheduled time.
    time: Instant,
    /// What to do.
    wake: Wake,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time
    }
}

impl Eq for Pending {}

/// Reverse order so the closest deadline is at the top.
impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reverse order so the closest deadline is at the top.
impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        other.time.cmp(&self.time)
    }
}

/// Deadlines for one downstream session.
///
/// There is at most one pending keepalive and one pending tick. Every
/// emission pushes the keepalive back by the idle period, so a keepalive only
/// fires after a full period of silence.
#[derive(Debug)]
pub struct Schedule {
    /// Pending wake-ups.
    pending: BinaryHeap<Pending>,
    /// Idle period before a keepalive.
    keepalive: Duration,
}

impl Schedule {
    /// A schedule whose first keepalive is due one period after `now`.
    pub fn new(now: Instant, keepalive: Duration) -> Self {
        let mut s = Self {
            pending: BinaryHeap::new(),
            keepalive,
        };
        s.emitted(now);
        s
    }

    /// Replace any pending wake of kind `wake` with one at `time`.
    fn set(&mut self, wake: Wake, time: Instant) {
        self.pending.retain(|p| p.wake != wake);
        self.pending.push(Pending { time, wake });
    }

    /// Record an emission at `now`, pushing the keepalive back.
    pub fn emitted(&mut self, now: Instant) {
        self.set(Wake::Keepalive, now + self.keepalive);
    }

    /// Schedule the next driver tick `delay` after `now`.
    pub fn tick_in(&mut self, now: Instant, delay: Duration) {
        self.set(Wake::Tick, now + delay);
    }

    /// The earliest deadline, if any.
    pub fn next(&self) -> Option<(Instant, Wake)> {
        self.pending.peek().map(|p| (p.time, p.wake))
    }

    /// The wait from `now` until the earliest deadline. A deadline in the
    /// past waits zero.
    pub fn wait(&self, now: Instant) -> Option<Duration> {
        self.next()
            .map(|(t, _)| t.checked_duration_since(now).unwrap_or(Duration::ZERO))
    }

    /// Remove and return the wakes due at `now`, earliest first. Due wakes
    /// are not rescheduled; the caller does that after acting on them.
    pub fn collect(&mut self, now: Instant) -> Vec<Wake> {
        let mut v = vec![];
        while let Some(p) = self.pending.pop() {
            if p.time <= now {
                v.push(p.wake);
            } else {
                // Put it back on the heap.
                self.pending.push(p);
                break;
            }
        }
        v
    }
}
