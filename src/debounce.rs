use std::time::{Duration, Instant};

/// Coalesces a burst of signals into one firing after a quiet period.
///
/// Every `signal` restarts the timer; `poll` reports true exactly once when
/// the delay has passed since the last signal.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn signal(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
