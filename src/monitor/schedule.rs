//! When the next status poll is due.
//!
//! Pure bookkeeping over `tokio::time::Instant`; the actor sleeps until
//! [`PollSchedule::next_deadline`] and asks [`PollSchedule::take_due`]
//! whether to poll.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
pub struct PollSchedule {
    interval: Duration,
    next_poll: Option<Instant>,
    confirmations: Vec<Instant>,
}

impl PollSchedule {
    pub fn new(interval: Duration) -> Self {
        PollSchedule {
            interval: interval.max(Duration::from_millis(1)),
            next_poll: None,
            confirmations: Vec::new(),
        }
    }

    /// Starts periodic polling; the first poll is due immediately
    pub fn start(&mut self, now: Instant) {
        self.next_poll = Some(now);
    }

    /// Stops periodic polling. Pending confirmations are dropped too.
    pub fn stop(&mut self) {
        self.next_poll = None;
        self.confirmations.clear();
    }

    pub fn is_running(&self) -> bool {
        self.next_poll.is_some()
    }

    /// Queues a one-off poll `delay` after `now`
    pub fn schedule_confirmation(&mut self, now: Instant, delay: Duration) {
        self.confirmations.push(now + delay);
    }

    pub fn pending_confirmations(&self) -> usize {
        self.confirmations.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.confirmations
            .iter()
            .copied()
            .chain(self.next_poll)
            .min()
    }

    /// Consumes every deadline at or before `now`. Missed periodic ticks
    /// collapse into one; returns whether a poll is due.
    pub fn take_due(&mut self, now: Instant) -> bool {
        let before = self.confirmations.len();
        self.confirmations.retain(|at| *at > now);
        let mut due = self.confirmations.len() != before;

        if let Some(next) = self.next_poll {
            if next <= now {
                due = true;
                let mut following = next + self.interval;
                while following <= now {
                    following += self.interval;
                }
                self.next_poll = Some(following);
            }
        }
        due
    }
}
