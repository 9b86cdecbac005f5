use std::{
    fmt,
    time::{Duration, Instant},
};

/// Callback invoked when a timer fires.
pub type TimerCallback = Box<dyn FnMut() + Send>;

/// Poll-driven countdown timer.
///
/// Nothing here is preemptive: a timer only fires inside `update`, so a
/// timer that is never updated never fires regardless of elapsed wall
/// clock. Skipping updates for longer than the timeout delays the firing,
/// it never corrupts it. Time is supplied by the caller, which keeps the
/// whole link layer testable with a simulated clock.
pub struct PollTimer {
    timeout: Duration,
    reference: Instant,
    repeating: bool,
    running: bool,
    done: bool,
    callback: Option<TimerCallback>,
}

impl PollTimer {
    /// Creates a stopped timer with the given timeout.
    pub fn new(timeout: Duration, now: Instant) -> Self {
        Self {
            timeout,
            reference: now,
            repeating: false,
            running: false,
            done: false,
            callback: None,
        }
    }

    /// Creates a stopped, auto-restarting timer.
    pub fn repeating(timeout: Duration, now: Instant) -> Self {
        Self {
            repeating: true,
            ..Self::new(timeout, now)
        }
    }

    /// Attaches a callback to invoke whenever the timer fires.
    pub fn with_callback(mut self, callback: TimerCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Arms the timer.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Disarms the timer. A paused timer keeps resetting its reference
    /// point on every update, so no elapsed time accumulates silently.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resets the reference point to `now`, restarting the countdown.
    pub fn reset(&mut self, now: Instant) {
        self.reference = now;
    }

    /// Replaces the timeout. Takes effect on the next update.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Advances the timer. When the elapsed time exceeds the timeout while
    /// armed: sets the done flag, invokes the callback if present, resets
    /// the reference point, and pauses unless repeating.
    pub fn update(&mut self, now: Instant) {
        if self.running {
            if now.duration_since(self.reference) > self.timeout {
                self.done = true;
                if let Some(callback) = self.callback.as_mut() {
                    callback();
                }
                self.reference = now;
                if !self.repeating {
                    self.running = false;
                }
            }
        } else {
            self.reference = now;
        }
    }

    /// Returns whether the timer has fired since `clear_done`.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Acknowledges a firing, so `is_done` reports each expiry once.
    pub fn clear_done(&mut self) {
        self.done = false;
    }

    /// Returns whether the timer is armed.
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl fmt::Debug for PollTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollTimer")
            .field("timeout", &self.timeout)
            .field("repeating", &self.repeating)
            .field("running", &self.running)
            .field("done", &self.done)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use super::*;

    #[test]
    fn does_not_fire_unless_started() {
        let start = Instant::now();
        let mut timer = PollTimer::new(Duration::from_millis(100), start);
        timer.update(start + Duration::from_secs(10));
        assert!(!timer.is_done());
    }

    #[test]
    fn fires_once_after_timeout_then_pauses() {
        let start = Instant::now();
        let mut timer = PollTimer::new(Duration::from_millis(100), start);
        timer.start();

        timer.update(start + Duration::from_millis(50));
        assert!(!timer.is_done());

        timer.update(start + Duration::from_millis(101));
        assert!(timer.is_done());
        assert!(!timer.is_running());

        timer.clear_done();
        timer.update(start + Duration::from_secs(5));
        assert!(!timer.is_done());
    }

    #[test]
    fn repeating_timer_rearms_itself() {
        let start = Instant::now();
        let mut timer = PollTimer::repeating(Duration::from_millis(100), start);
        timer.start();

        timer.update(start + Duration::from_millis(101));
        assert!(timer.is_done());
        assert!(timer.is_running());
        timer.clear_done();

        timer.update(start + Duration::from_millis(202));
        assert!(timer.is_done());
    }

    #[test]
    fn paused_timer_tracks_now_so_elapsed_does_not_accumulate() {
        let start = Instant::now();
        let mut timer = PollTimer::new(Duration::from_millis(100), start);

        // Long pause: reference keeps following now.
        timer.update(start + Duration::from_secs(60));
        timer.start();
        timer.update(start + Duration::from_secs(60) + Duration::from_millis(50));
        assert!(!timer.is_done());
        timer.update(start + Duration::from_secs(60) + Duration::from_millis(101));
        assert!(timer.is_done());
    }

    #[test]
    fn reset_restarts_the_countdown() {
        let start = Instant::now();
        let mut timer = PollTimer::new(Duration::from_millis(100), start);
        timer.start();

        timer.update(start + Duration::from_millis(90));
        timer.reset(start + Duration::from_millis(90));
        timer.update(start + Duration::from_millis(150));
        assert!(!timer.is_done());
        timer.update(start + Duration::from_millis(191));
        assert!(timer.is_done());
    }

    #[test]
    fn callback_runs_on_every_expiry() {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let start = Instant::now();
        let mut timer = PollTimer::repeating(Duration::from_millis(100), start)
            .with_callback(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        timer.start();

        timer.update(start + Duration::from_millis(101));
        timer.update(start + Duration::from_millis(202));
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn set_timeout_extends_the_deadline() {
        let start = Instant::now();
        let mut timer = PollTimer::new(Duration::from_millis(100), start);
        timer.start();
        timer.set_timeout(Duration::from_millis(500));

        timer.update(start + Duration::from_millis(200));
        assert!(!timer.is_done());
        timer.update(start + Duration::from_millis(501));
        assert!(timer.is_done());
    }
}
