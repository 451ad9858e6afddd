use std::time::{Duration, Instant};

/// Delay between the end of one tick and the next
pub const TICK_DELAY: Duration = Duration::from_millis(30);

/// Handle for a scheduled tick, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken(u64);

/// Arms ticks for the snow driver.
///
/// There are no stored callbacks: the owner drains due tokens from the
/// scheduler and runs its tick for each token it still recognises.
pub trait Scheduler {
    fn schedule_tick(&mut self, now: Instant, delay: Duration) -> TickToken;
    /// Returns false if the token had already fired or been cancelled
    fn cancel(&mut self, token: TickToken) -> bool;
    /// Remove and return every token whose deadline has passed
    fn take_due(&mut self, now: Instant) -> Vec<TickToken>;
    fn pending(&self) -> usize;
}

/// Deadline-based scheduler polled by the frame loop.
///
/// A tick is only released on a frame, so the effective cadence is the
/// armed delay rounded up to the next frame poll.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_token: u64,
    armed: Vec<(TickToken, Instant)>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Earliest pending deadline, for sizing the event poll
    pub fn next_deadline(&self) -> Option<Instant> {
        self.armed.iter().map(|(_, at)| *at).min()
    }
}

impl Scheduler for FrameScheduler {
    fn schedule_tick(&mut self, now: Instant, delay: Duration) -> TickToken {
        let token = TickToken(self.next_token);
        self.next_token += 1;
        self.armed.push((token, now + delay));
        token
    }

    fn cancel(&mut self, token: TickToken) -> bool {
        let before = self.armed.len();
        self.armed.retain(|(t, _)| *t != token);
        self.armed.len() != before
    }

    fn take_due(&mut self, now: Instant) -> Vec<TickToken> {
        let mut due: Vec<(TickToken, Instant)> = Vec::new();
        self.armed.retain(|&(token, at)| {
            if at <= now {
                due.push((token, at));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|&(_, at)| at);
        due.into_iter().map(|(token, _)| token).collect()
    }

    fn pending(&self) -> usize {
        self.armed.len()
    }
}
