//! Rolling-window submission rate tracking.
//!
//! [`RateTracker`] maintains three fixed-width rolling windows (1m/5m/15m by
//! default) and answers "how many events landed within the last window" at
//! query time. Counts are rolling, not cumulative: events older than a
//! window's duration are excluded from its rate.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// The three tracked reporting windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
}

impl Window {
    pub const ALL: [Window; 3] = [Window::OneMinute, Window::FiveMinutes, Window::FifteenMinutes];

    /// Default duration of this window.
    pub fn duration(&self) -> Duration {
        match self {
            Window::OneMinute => Duration::from_secs(60),
            Window::FiveMinutes => Duration::from_secs(5 * 60),
            Window::FifteenMinutes => Duration::from_secs(15 * 60),
        }
    }

    fn index(&self) -> usize {
        match self {
            Window::OneMinute => 0,
            Window::FiveMinutes => 1,
            Window::FifteenMinutes => 2,
        }
    }
}

#[derive(Debug)]
struct TrackedWindow {
    duration: Duration,
    events: Mutex<VecDeque<(Instant, u64)>>,
}

impl TrackedWindow {
    fn new(duration: Duration) -> Self {
        Self {
            duration,
            events: Mutex::new(VecDeque::new()),
        }
    }

    fn record(&self, now: Instant, count: u64) {
        let mut events = self.events.lock().unwrap();
        events.push_back((now, count));
        Self::prune(&mut events, now, self.duration);
    }

    fn rate(&self, now: Instant) -> u64 {
        let mut events = self.events.lock().unwrap();
        Self::prune(&mut events, now, self.duration);
        events.iter().map(|(_, count)| count).sum()
    }

    fn prune(events: &mut VecDeque<(Instant, u64)>, now: Instant, duration: Duration) {
        while let Some((stamp, _)) = events.front() {
            if now.duration_since(*stamp) > duration {
                events.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Multi-window rolling event counter.
///
/// A single `record` call stamps the event into every tracked window;
/// each window is queried independently. Interior mutability keeps the
/// tracker shareable should submission and reporting ever run on
/// separate execution paths.
#[derive(Debug)]
pub struct RateTracker {
    windows: [TrackedWindow; 3],
}

impl Default for RateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RateTracker {
    /// Tracker with the standard 1/5/15 minute windows.
    pub fn new() -> Self {
        Self::with_durations([
            Window::OneMinute.duration(),
            Window::FiveMinutes.duration(),
            Window::FifteenMinutes.duration(),
        ])
    }

    /// Tracker with custom window spans, positionally mapped onto
    /// [`Window::ALL`]. Mostly useful for tests that need fast aging.
    pub fn with_durations(durations: [Duration; 3]) -> Self {
        Self {
            windows: durations.map(TrackedWindow::new),
        }
    }

    /// Add `count` occurrences timestamped "now" to every window.
    pub fn record(&self, count: u64) {
        let now = Instant::now();
        for window in &self.windows {
            window.record(now, count);
        }
    }

    /// Occurrences still inside `[now - duration, now]` for one window.
    /// Computed at call time, never cached.
    pub fn rate(&self, window: Window) -> u64 {
        self.windows[window.index()].rate(Instant::now())
    }

    /// Per-second equivalents for the three windows, in 1m/5m/15m order.
    /// Each figure is the window's rolling count divided by its span.
    pub fn tps(&self) -> (f64, f64, f64) {
        let per_second = |w: Window| {
            let span = self.windows[w.index()].duration.as_secs_f64();
            self.rate(w) as f64 / span
        };
        (
            per_second(Window::OneMinute),
            per_second(Window::FiveMinutes),
            per_second(Window::FifteenMinutes),
        )
    }
}
