use std::time::{Duration, Instant};

/// Debounces rapid successive inputs, holding the latest payload until
/// a quiet period has elapsed.
///
/// Used for the global-filter and column-filter text paths so the grid
/// is not re-filtered on every keystroke. The engine polls
/// [`Debouncer::take_ready`] from its `tick()`.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    last_event: Option<Instant>,
    pending: Option<T>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            last_event: None,
            pending: None,
        }
    }

    /// Register a new input, replacing any pending one and restarting
    /// the quiet-period timer.
    pub fn submit(&mut self, payload: T) {
        self.last_event = Some(Instant::now());
        self.pending = Some(payload);
    }

    /// Return the pending payload if the quiet period has elapsed.
    pub fn take_ready(&mut self) -> Option<T> {
        let last = self.last_event?;
        if last.elapsed() >= self.delay {
            self.last_event = None;
            self.pending.take()
        } else {
            None
        }
    }

    /// Take the pending payload immediately, ignoring the timer.
    /// Used when the host forces an apply (e.g. Enter pressed).
    pub fn flush(&mut self) -> Option<T> {
        self.last_event = None;
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancel any pending payload.
    pub fn reset(&mut self) {
        self.last_event = None;
        self.pending = None;
    }

    /// Time left before the pending payload becomes ready.
    pub fn time_remaining(&self) -> Option<Duration> {
        let last = self.last_event?;
        self.pending.as_ref()?;
        let elapsed = last.elapsed();
        Some(if elapsed >= self.delay {
            Duration::ZERO
        } else {
            self.delay - elapsed
        })
    }
}
