use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::config::RadarOptions;

/// Single owned deadline. Arming replaces whatever was pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    pub fn arm(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarms and returns true once `now` has reached the deadline.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Trailing-edge debounce plus a readiness retry loop, driven by polling.
#[derive(Debug)]
pub struct UpdateScheduler {
    debounce: Timer,
    retry: Timer,
    debounce_window: Duration,
    readiness_poll: Duration,
    coalesced: u32,
}

impl UpdateScheduler {
    pub fn new(options: RadarOptions) -> Self {
        Self {
            debounce: Timer::default(),
            retry: Timer::default(),
            debounce_window: options.debounce,
            readiness_poll: options.readiness_poll,
            coalesced: 0,
        }
    }

    /// Restarts the quiet window; only the last request in a burst renders.
    pub fn request_update(&mut self, now: Instant) {
        self.debounce.arm(now + self.debounce_window);
        self.retry.cancel();
        self.coalesced = self.coalesced.saturating_add(1);
        trace!(coalesced = self.coalesced, "radar_update_requested");
    }

    pub fn request_immediate(&mut self, now: Instant) {
        self.debounce.arm(now);
        self.retry.cancel();
        self.coalesced = self.coalesced.saturating_add(1);
    }

    /// True exactly when a render should run at `now`.
    pub fn poll(&mut self, now: Instant, ready: bool) -> bool {
        let debounce_due = self.debounce.fire_if_due(now);
        let retry_due = self.retry.fire_if_due(now);
        if !(debounce_due || retry_due) {
            return false;
        }

        if ready {
            debug!(coalesced = self.coalesced, "radar_update_due");
            self.coalesced = 0;
            return true;
        }

        self.retry.arm(now + self.readiness_poll);
        debug!(
            retry_in_ms = self.readiness_poll.as_millis() as u64,
            "radar_not_ready"
        );
        false
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.debounce.deadline(), self.retry.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.debounce.is_armed() || self.retry.is_armed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn scheduler() -> UpdateScheduler {
        UpdateScheduler::new(RadarOptions::default())
    }

    #[test]
    fn timer_fires_once_at_deadline() {
        let start = Instant::now();
        let mut timer = Timer::default();
        timer.arm(start + ms(50));
        assert!(!timer.fire_if_due(start + ms(49)));
        assert!(timer.fire_if_due(start + ms(50)));
        assert!(!timer.fire_if_due(start + ms(500)));
        assert!(!timer.is_armed());
    }

    #[test]
    fn arming_replaces_previous_deadline() {
        let start = Instant::now();
        let mut timer = Timer::default();
        timer.arm(start + ms(10));
        timer.arm(start + ms(90));
        assert_eq!(timer.deadline(), Some(start + ms(90)));
        timer.cancel();
        assert_eq!(timer.deadline(), None);
    }

    #[test]
    fn burst_within_window_renders_once() {
        let start = Instant::now();
        let mut scheduler = scheduler();
        let mut renders = 0;

        for step in 0..10u64 {
            let now = start + ms(step * 20);
            scheduler.request_update(now);
            if scheduler.poll(now, true) {
                renders += 1;
            }
        }
        for step in 0..20u64 {
            if scheduler.poll(start + ms(180 + step * 10), true) {
                renders += 1;
            }
        }

        assert_eq!(renders, 1);
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn render_waits_for_quiet_window_after_last_request() {
        let start = Instant::now();
        let mut scheduler = scheduler();
        scheduler.request_update(start);
        scheduler.request_update(start + ms(80));
        assert!(!scheduler.poll(start + ms(100), true));
        assert!(!scheduler.poll(start + ms(179), true));
        assert!(scheduler.poll(start + ms(180), true));
    }

    #[test]
    fn spaced_requests_render_once_each() {
        let start = Instant::now();
        let mut scheduler = scheduler();
        let mut renders = 0;

        for index in 0..4u64 {
            let requested = start + ms(index * 250);
            scheduler.request_update(requested);
            if scheduler.poll(requested + ms(100), true) {
                renders += 1;
            }
        }

        assert_eq!(renders, 4);
    }

    #[test]
    fn not_ready_retries_until_ready() {
        let start = Instant::now();
        let mut scheduler = scheduler();
        scheduler.request_update(start);

        assert!(!scheduler.poll(start + ms(100), false));
        assert_eq!(scheduler.next_deadline(), Some(start + ms(200)));
        assert!(!scheduler.poll(start + ms(150), true));
        assert!(!scheduler.poll(start + ms(200), false));
        assert_eq!(scheduler.next_deadline(), Some(start + ms(300)));
        assert!(scheduler.poll(start + ms(300), true));
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn new_request_supersedes_pending_retry() {
        let start = Instant::now();
        let mut scheduler = scheduler();
        scheduler.request_update(start);
        assert!(!scheduler.poll(start + ms(100), false));

        scheduler.request_update(start + ms(150));
        assert_eq!(scheduler.next_deadline(), Some(start + ms(250)));
        assert!(!scheduler.poll(start + ms(200), true));
        assert!(scheduler.poll(start + ms(250), true));
    }

    #[test]
    fn immediate_request_is_due_now() {
        let start = Instant::now();
        let mut scheduler = scheduler();
        scheduler.request_update(start);
        scheduler.request_immediate(start + ms(10));
        assert_eq!(scheduler.next_deadline(), Some(start + ms(10)));
        assert!(scheduler.poll(start + ms(10), true));
        assert!(!scheduler.poll(start + ms(110), true));
    }

    #[test]
    fn idle_scheduler_never_fires() {
        let mut scheduler = scheduler();
        assert!(!scheduler.poll(Instant::now(), true));
        assert_eq!(scheduler.next_deadline(), None);
    }
}
