use super::Timestamp;

/// Handle returned by [`TimerQueue::schedule`]. Cancelling a token that already
/// fired, or was never scheduled, is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy)]
struct Entry {
    token: TimerToken,
    deadline: Timestamp,
}

/// Cooperative delayed tasks for a single-threaded event loop.
///
/// Nothing here sleeps or spawns. The owner schedules a deadline, keeps the
/// token, and the loop calls [`TimerQueue::take_due`] whenever it gets control
/// (every frame, every input event). Whoever holds the token decides what a
/// fired token means; a token that was cancelled never comes back out of
/// `take_due`.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: Vec<Entry>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a deadline `delay` seconds after `now`
    pub fn schedule(&mut self, now: Timestamp, delay: f64) -> TimerToken {
        self.next_id += 1;
        let token = TimerToken(self.next_id);
        self.pending.push(Entry {
            token,
            deadline: now + delay.max(0.0),
        });
        token
    }

    /// Cancel a pending timer. Returns true if it was still pending.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|entry| entry.token != token);
        self.pending.len() != before
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.iter().any(|entry| entry.token == token)
    }

    /// Remove and return every timer whose deadline is at or before `now`,
    /// earliest first.
    pub fn take_due(&mut self, now: Timestamp) -> Vec<TimerToken> {
        let mut due: Vec<Entry> = Vec::new();
        self.pending.retain(|entry| {
            if entry.deadline <= now {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.deadline.total_cmp(&b.deadline));
        due.into_iter().map(|entry| entry.token).collect()
    }

    /// Earliest pending deadline, used by the shell to schedule a repaint
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.pending
            .iter()
            .map(|entry| entry.deadline)
            .min_by(|a, b| a.total_cmp(b))
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_timers_fire_in_deadline_order() {
        let mut timers = TimerQueue::new();
        let late = timers.schedule(0.0, 2.0);
        let early = timers.schedule(0.0, 1.0);

        assert!(timers.take_due(0.5).is_empty());
        assert_eq!(timers.take_due(3.0), vec![early, late]);
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut timers = TimerQueue::new();
        let token = timers.schedule(10.0, 0.5);

        assert!(timers.cancel(token));
        assert!(!timers.cancel(token));
        assert!(timers.take_due(100.0).is_empty());
    }

    #[test]
    fn test_next_deadline() {
        let mut timers = TimerQueue::new();
        assert_eq!(timers.next_deadline(), None);

        timers.schedule(1.0, 0.5);
        let token = timers.schedule(1.0, 0.25);
        assert_eq!(timers.next_deadline(), Some(1.25));

        timers.cancel(token);
        assert_eq!(timers.next_deadline(), Some(1.5));
    }

    #[test]
    fn test_tokens_are_unique() {
        let mut timers = TimerQueue::new();
        let a = timers.schedule(0.0, 1.0);
        let b = timers.schedule(0.0, 1.0);
        assert_ne!(a, b);
        assert!(timers.is_pending(a) && timers.is_pending(b));
    }
}
