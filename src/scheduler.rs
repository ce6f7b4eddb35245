/*
 * Scheduler Module
 *
 * Single-threaded cancellable timers. The host polls the scheduler with the
 * current time and gets back each due task in (due time, creation) order.
 *
 * Handles are never reused, so a handle held past cancellation can never
 * match a newer timer.
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Tick,
    Spawn,
}

#[derive(Debug, Clone)]
struct Timer {
    handle: TimerHandle,
    due: f64,
    period: Option<f64>,
    task: Task,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    timers: Vec<Timer>,
    skipped_periods: u64,
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fired {
    pub handle: TimerHandle,
    pub task: Task,
    pub due: f64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, due: f64, period: Option<f64>, task: Task) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer { handle, due, period, task });
        handle
    }

    pub fn schedule_once(&mut self, due: f64, task: Task) -> TimerHandle {
        self.insert(due, None, task)
    }

    /// Fires first at `first_due`, then every `period` milliseconds.
    pub fn schedule_every(&mut self, first_due: f64, period: f64, task: Task) -> TimerHandle {
        self.insert(first_due, Some(period.max(1.0)), task)
    }

    /// Returns whether the timer was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.handle != handle);
        self.timers.len() != before
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Periods dropped because the host polled too late to run them.
    pub fn skipped_periods(&self) -> u64 {
        self.skipped_periods
    }

    // Take the earliest timer due at `now`. A periodic timer is moved to its
    // next slot after `now`; missed slots are skipped rather than replayed.
    pub fn pop_due(&mut self, now: f64) -> Option<Fired> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.handle.cmp(&b.handle)))
            .map(|(i, _)| i)?;

        let timer = &mut self.timers[index];
        let fired = Fired { handle: timer.handle, task: timer.task, due: timer.due };

        match timer.period {
            Some(period) => {
                let mut next = timer.due + period;
                if next <= now {
                    let missed = ((now - next) / period).floor() + 1.0;
                    self.skipped_periods += missed as u64;
                    next += missed * period;
                }
                timer.due = next;
            }
            None => {
                self.timers.swap_remove(index);
            }
        }

        Some(fired)
    }
}
