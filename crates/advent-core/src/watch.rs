use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, trace};

use crate::time::TimeFacade;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Events sent from the rollover poller to the calendar owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// The wall-clock day is now the given date.
    DayChanged(NaiveDate),
}

/// Background poller that notices when the current day changes.
///
/// The owner keeps the day list; the poller only reports. Dropping the
/// watcher stops and joins the thread.
pub struct RolloverWatcher {
    stop: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    rx: mpsc::Receiver<ClockEvent>,
}

impl RolloverWatcher {
    /// Polls `facade.today()` every `interval`.
    pub fn start(facade: TimeFacade, interval: Duration) -> std::io::Result<Self> {
        Self::spawn(move || facade.today(), interval)
    }

    /// Polls an arbitrary source of "today".
    pub fn spawn<F>(today: F, interval: Duration) -> std::io::Result<Self>
    where
        F: Fn() -> NaiveDate + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (tx, rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("advent-rollover".to_string())
            .spawn(move || {
                let mut last = today();
                info!(%last, interval_ms = interval.as_millis() as u64, "rollover poller started");
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    let current = today();
                    trace!(%current, "rollover poll");
                    if current != last {
                        debug!(from = %last, to = %current, "day changed");
                        last = current;
                        if tx.send(ClockEvent::DayChanged(current)).is_err() {
                            break;
                        }
                    }
                }
                debug!("rollover poller stopped");
            })?;

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
            rx,
        })
    }

    /// Non-blocking poll for pending events.
    pub fn poll(&self) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Blocks up to `timeout` for the next event.
    pub fn wait(&self, timeout: Duration) -> Option<ClockEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Stops the poller and waits for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RolloverWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::NaiveDate;

    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn reports_day_changes_once() {
        let day = Arc::new(Mutex::new(ymd(2025, 12, 1)));
        let source = Arc::clone(&day);
        let watcher = RolloverWatcher::spawn(
            move || *source.lock().expect("day lock"),
            Duration::from_millis(5),
        )
        .expect("spawn watcher");

        assert_eq!(watcher.wait(Duration::from_millis(50)), None);

        *day.lock().expect("day lock") = ymd(2025, 12, 2);
        assert_eq!(
            watcher.wait(Duration::from_secs(5)),
            Some(ClockEvent::DayChanged(ymd(2025, 12, 2)))
        );
        assert_eq!(watcher.wait(Duration::from_millis(50)), None);
        assert!(watcher.poll().is_empty());

        watcher.stop();
    }

    #[test]
    fn drop_stops_a_slow_poller_promptly() {
        let watcher = RolloverWatcher::spawn(|| ymd(2025, 12, 1), Duration::from_secs(3600))
            .expect("spawn watcher");
        let started = std::time::Instant::now();
        drop(watcher);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
