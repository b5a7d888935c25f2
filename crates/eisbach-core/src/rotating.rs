//! Rotating status messages.
//!
//! While a request is in flight, data sources expose a status line that
//! cycles through a list of messages on a fixed interval. [`RotatingMessages`]
//! owns exactly one ticker task; starting it again replaces the running one.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use eisbach_core::{RestPolicy, RotatingMessages};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let status = RotatingMessages::new(
//!     vec!["Loading...".into(), "Still loading...".into()],
//!     Duration::from_millis(2500),
//!     RestPolicy::First,
//! );
//! status.start();
//! assert_eq!(status.message(), "Loading...");
//! status.stop();
//! assert!(!status.is_running());
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::trace;

/// What the exposed message shows when the ticker is not running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestPolicy {
    /// Show the first message of the list.
    #[default]
    First,
    /// Show an empty string.
    Empty,
}

#[derive(Debug)]
struct Shared {
    current: watch::Sender<String>,
    /// Bumped on every start/stop; tickers only publish for their own epoch.
    epoch: Mutex<u64>,
}

impl Shared {
    fn publish(&self, epoch: u64, message: String) {
        let guard = lock(&self.epoch);
        if *guard == epoch {
            self.current.send_replace(message);
        }
    }
}

/// A cyclically advancing status string.
#[derive(Debug)]
pub struct RotatingMessages {
    messages: watch::Sender<Vec<String>>,
    shared: Arc<Shared>,
    interval: Duration,
    rest: RestPolicy,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RotatingMessages {
    /// Create a stopped ticker over `messages`.
    pub fn new(messages: Vec<String>, interval: Duration, rest: RestPolicy) -> Self {
        let initial = rest_value(&messages, rest);
        let (messages, _) = watch::channel(messages);
        let (current, _) = watch::channel(initial);
        Self {
            messages,
            shared: Arc::new(Shared {
                current,
                epoch: Mutex::new(0),
            }),
            interval,
            rest,
            handle: Mutex::new(None),
        }
    }

    /// The currently exposed message.
    pub fn message(&self) -> String {
        self.shared.current.borrow().clone()
    }

    /// Subscribe to changes of the exposed message.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.shared.current.subscribe()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a ticker task is active.
    pub fn is_running(&self) -> bool {
        lock(&self.handle)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Replace the message list.
    ///
    /// A running ticker picks the new list up at once, keeping its position.
    pub fn set_messages(&self, messages: Vec<String>) {
        let idle_value = rest_value(&messages, self.rest);
        self.messages.send_replace(messages);
        if !self.is_running() {
            self.shared.current.send_replace(idle_value);
        }
    }

    /// Show the first message and advance once per interval.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let mut handle = lock(&self.handle);
        if let Some(previous) = handle.take() {
            previous.abort();
        }

        let epoch = {
            let mut guard = lock(&self.shared.epoch);
            *guard += 1;
            if let Some(first) = self.messages.borrow().first() {
                self.shared.current.send_replace(first.clone());
            }
            *guard
        };

        let period = self.interval;
        let shared = Arc::clone(&self.shared);
        let mut messages = self.messages.subscribe();

        *handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            let mut tick: usize = 0;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tick = tick.wrapping_add(1);
                    }
                    changed = messages.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                let next = {
                    let list = messages.borrow_and_update();
                    if list.is_empty() {
                        None
                    } else {
                        Some(list[tick % list.len()].clone())
                    }
                };
                if let Some(message) = next {
                    trace!(tick, %message, "Status message");
                    shared.publish(epoch, message);
                }
            }
        }));
    }

    /// Cancel the ticker and show the rest value.
    pub fn stop(&self) {
        let mut handle = lock(&self.handle);
        if let Some(task) = handle.take() {
            task.abort();
        }
        let mut guard = lock(&self.shared.epoch);
        *guard += 1;
        let rest = rest_value(&self.messages.borrow(), self.rest);
        self.shared.current.send_replace(rest);
    }
}

impl Drop for RotatingMessages {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.handle).take() {
            task.abort();
        }
    }
}

fn rest_value(messages: &[String], rest: RestPolicy) -> String {
    match rest {
        RestPolicy::First => messages.first().cloned().unwrap_or_default(),
        RestPolicy::Empty => String::new(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    const PERIOD: Duration = Duration::from_millis(100);

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn half() -> Duration {
        PERIOD / 2
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_shows_first_message_immediately() {
        let status = RotatingMessages::new(list(&["a", "b", "c"]), PERIOD, RestPolicy::Empty);
        assert_eq!(status.message(), "");

        status.start();
        assert_eq!(status.message(), "a");
        assert!(status.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_message_at_tick_k_wraps() {
        let status = RotatingMessages::new(list(&["a", "b", "c"]), PERIOD, RestPolicy::First);
        status.start();

        let expected = ["a", "b", "c", "a", "b", "c", "a"];
        sleep(half()).await;
        for (k, want) in expected.iter().enumerate() {
            assert_eq!(status.message(), *want, "tick {k}");
            sleep(PERIOD).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_resets_and_freezes() {
        let status = RotatingMessages::new(list(&["a", "b", "c"]), PERIOD, RestPolicy::First);
        status.start();
        sleep(PERIOD + half()).await;
        assert_eq!(status.message(), "b");

        status.stop();
        assert_eq!(status.message(), "a");
        assert!(!status.is_running());

        sleep(PERIOD * 5).await;
        assert_eq!(status.message(), "a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_with_empty_rest() {
        let status = RotatingMessages::new(list(&["a", "b"]), PERIOD, RestPolicy::Empty);
        status.start();
        sleep(PERIOD + half()).await;
        status.stop();
        assert_eq!(status.message(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_running_ticker() {
        let status = RotatingMessages::new(list(&["a", "b", "c"]), PERIOD, RestPolicy::First);
        status.start();
        sleep(PERIOD + half()).await;
        assert_eq!(status.message(), "b");

        status.start();
        assert_eq!(status.message(), "a");
        sleep(half()).await;
        // A leaked first ticker would have moved the message to "c" by now.
        assert_eq!(status.message(), "a");
        sleep(PERIOD).await;
        assert_eq!(status.message(), "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_list_defers_updates() {
        let status = RotatingMessages::new(Vec::new(), PERIOD, RestPolicy::Empty);
        status.start();
        assert_eq!(status.message(), "");
        sleep(PERIOD * 3).await;
        assert_eq!(status.message(), "");

        status.set_messages(list(&["x", "y"]));
        sleep(Duration::from_millis(1)).await;
        assert!(!status.message().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_language_switch_without_restart() {
        let status = RotatingMessages::new(list(&["one", "two", "three"]), PERIOD, RestPolicy::First);
        status.start();
        sleep(PERIOD + half()).await;
        assert_eq!(status.message(), "two");

        status.set_messages(list(&["uno", "dos", "tres"]));
        sleep(Duration::from_millis(1)).await;
        assert_eq!(status.message(), "dos");
        assert!(status.is_running());

        sleep(PERIOD).await;
        assert_eq!(status.message(), "tres");
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_sees_updates() {
        let status = RotatingMessages::new(list(&["a", "b"]), PERIOD, RestPolicy::First);
        let mut rx = status.subscribe();
        status.start();
        sleep(PERIOD + half()).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), "b");
    }

    #[test]
    fn test_set_messages_while_idle_updates_rest_value() {
        let status = RotatingMessages::new(list(&["a"]), PERIOD, RestPolicy::First);
        status.set_messages(list(&["z"]));
        assert_eq!(status.message(), "z");
    }
}
