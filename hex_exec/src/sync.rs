//! # Synchronisation with the PWM cycle
//!
//! The actuation layer increments a counter once per PWM period. The motion
//! core must advance exactly one trajectory step per increment, so the
//! counter is edge-detected here and missed increments are reported.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, warn};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Edge detector for the synchronisation counter.
#[derive(Debug, Default, Clone)]
pub struct SyncMonitor {
    prev: Option<u32>,
}

/// Host stand-in for the PWM period interrupt.
///
/// A background thread increments a shared counter every period.
pub struct SyncTicker {
    counter: Arc<AtomicU32>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Result of polling the synchronisation counter.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Counter unchanged since the last poll.
    NoChange,
    /// Counter advanced by exactly one.
    Tick,
    /// Counter advanced by more than one, `delta - 1` ticks were missed.
    Missed { delta: u32 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SyncMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the counter with the value seen on the previous poll.
    ///
    /// The first poll is always a tick. The counter is allowed to wrap.
    pub fn poll(&mut self, counter: u32) -> SyncEvent {
        let event = match self.prev {
            None => SyncEvent::Tick,
            Some(prev) => match counter.wrapping_sub(prev) {
                0 => SyncEvent::NoChange,
                1 => SyncEvent::Tick,
                delta => SyncEvent::Missed { delta },
            },
        };

        self.prev = Some(counter);
        event
    }
}

impl SyncTicker {
    /// Start incrementing the counter every `period`.
    pub fn spawn(period: Duration) -> Self {
        let counter = Arc::new(AtomicU32::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        let c = counter.clone();
        let s = stop.clone();
        let handle = thread::spawn(move || {
            while !s.load(Ordering::Relaxed) {
                thread::sleep(period);
                c.fetch_add(1, Ordering::Release);
            }
        });

        debug!("Sync ticker started with a period of {:?}", period);

        Self {
            counter,
            stop,
            handle: Some(handle),
        }
    }

    /// Current counter value.
    pub fn counter(&self) -> u32 {
        self.counter.load(Ordering::Acquire)
    }

    /// Stop the background thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);

        if let Some(h) = self.handle.take() {
            if h.join().is_err() {
                warn!("Sync ticker thread panicked");
            }
        }
    }
}

impl Drop for SyncTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_poll() {
        let mut m = SyncMonitor::new();

        assert_eq!(m.poll(10), SyncEvent::Tick);
        assert_eq!(m.poll(10), SyncEvent::NoChange);
        assert_eq!(m.poll(11), SyncEvent::Tick);
        assert_eq!(m.poll(14), SyncEvent::Missed { delta: 3 });
        assert_eq!(m.poll(15), SyncEvent::Tick);
    }

    #[test]
    fn test_poll_wraps() {
        let mut m = SyncMonitor::new();

        m.poll(std::u32::MAX);
        assert_eq!(m.poll(0), SyncEvent::Tick);
        assert_eq!(m.poll(2), SyncEvent::Missed { delta: 2 });
    }

    #[test]
    fn test_ticker_advances() {
        let mut t = SyncTicker::spawn(Duration::from_millis(1));
        thread::sleep(Duration::from_millis(50));
        let c = t.counter();
        t.stop();
        assert!(c > 0);
        assert_eq!(t.counter(), t.counter());
    }
}
