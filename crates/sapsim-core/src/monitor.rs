//! The request monitor: a bounded log of recent transactions with live
//! fan-out.
//!
//! [`RequestMonitor::log_request`] appends under a short mutex critical
//! section (push plus front eviction), so concurrent appends are
//! linearizable and the log never exceeds its capacity. It then raises a
//! synchronous in-process event for [`EventSubscriber`]s and publishes the
//! entry on a [`broadcast`] channel. Observers drain that channel on their
//! own tasks, so a slow or dead observer never delays the request path.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use sapsim_types::RequestLogEntry;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Default maximum number of retained entries.
pub const DEFAULT_MAX_REQUESTS: usize = 1000;

/// Default capacity of the observer broadcast channel.
///
/// An observer that falls behind by more than this many entries receives
/// [`broadcast::error::RecvError::Lagged`] and skips ahead.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Synchronous in-process listener, called on every logged entry.
pub type EventSubscriber = Arc<dyn Fn(&RequestLogEntry) + Send + Sync>;

/// Bounded, concurrency-safe log of recent transactions.
pub struct RequestMonitor {
    entries: Mutex<VecDeque<RequestLogEntry>>,
    max_requests: usize,
    tx: broadcast::Sender<Arc<RequestLogEntry>>,
    subscribers: RwLock<Vec<EventSubscriber>>,
}

impl core::fmt::Debug for RequestMonitor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RequestMonitor")
            .field("max_requests", &self.max_requests)
            .field("observers", &self.tx.receiver_count())
            .finish_non_exhaustive()
    }
}

impl Default for RequestMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_BROADCAST_CAPACITY)
    }
}

impl RequestMonitor {
    /// Create a monitor keeping at most `max_requests` entries (minimum 1).
    pub fn new(max_requests: usize, broadcast_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(broadcast_capacity.max(1));
        let max_requests = max_requests.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(max_requests)),
            max_requests,
            tx,
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Configured capacity.
    pub const fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Append an entry, evicting the oldest past capacity, then notify
    /// in-process subscribers and live observers.
    pub fn log_request(&self, entry: RequestLogEntry) {
        let entry = Arc::new(entry);
        {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.push_back(RequestLogEntry::clone(&entry));
            while entries.len() > self.max_requests {
                entries.pop_front();
            }
        }

        self.raise_event(&entry);
        self.notify_observers(entry);
    }

    /// Up to `count` entries, most recent first.
    pub fn get_recent_requests(&self, count: usize) -> Vec<RequestLogEntry> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().rev().take(count).cloned().collect()
    }

    /// Empty the log.
    pub fn clear_requests(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let cleared = entries.len();
        entries.clear();
        debug!(cleared, "Request log cleared");
    }

    /// Current number of retained entries.
    pub fn get_total_request_count(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Push an entry to every connected observer.
    ///
    /// Having no observers is normal and only logged at debug level.
    pub fn notify_observers(&self, entry: Arc<RequestLogEntry>) {
        let id = entry.id;
        match self.tx.send(entry) {
            Ok(observers) => debug!(request_id = %id, observers, "Request broadcast"),
            Err(_) => debug!(request_id = %id, "No observers connected, broadcast skipped"),
        }
    }

    /// Register an observer. The receiver yields every entry logged after
    /// this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RequestLogEntry>> {
        self.tx.subscribe()
    }

    /// Number of connected observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Register a synchronous in-process listener.
    pub fn subscribe_events(&self, subscriber: EventSubscriber) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(subscriber);
    }

    fn raise_event(&self, entry: &RequestLogEntry) {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for subscriber in &subscribers {
            subscriber(entry);
        }
    }
}

/// Request counters fed by the monitor's synchronous event.
#[derive(Debug, Default)]
pub struct RequestCounters {
    total: AtomicU64,
    success: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
    simulated: AtomicU64,
}

/// Point-in-time copy of [`RequestCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// Entries logged since start.
    pub total: u64,
    /// `2xx` responses.
    pub success: u64,
    /// `4xx` responses.
    pub client_errors: u64,
    /// `5xx` responses.
    pub server_errors: u64,
    /// Requests that carried the simulation header.
    pub simulated: u64,
}

impl RequestCounters {
    /// Create counters and subscribe them to `monitor`.
    pub fn attach(monitor: &RequestMonitor) -> Arc<Self> {
        let counters = Arc::new(Self::default());
        let sink = Arc::clone(&counters);
        monitor.subscribe_events(Arc::new(move |entry: &RequestLogEntry| sink.record(entry)));
        counters
    }

    /// Count one entry.
    pub fn record(&self, entry: &RequestLogEntry) {
        self.total.fetch_add(1, Ordering::Relaxed);
        let class = match entry.status_code {
            200..=299 => Some(&self.success),
            400..=499 => Some(&self.client_errors),
            500..=599 => Some(&self.server_errors),
            _ => None,
        };
        if let Some(counter) = class {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        let simulated = entry
            .headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(crate::simulation::SIMULATE_ERROR_HEADER));
        if simulated {
            self.simulated.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Read all counters.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total: self.total.load(Ordering::Relaxed),
            success: self.success.load(Ordering::Relaxed),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
            simulated: self.simulated.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{BTreeMap, HashSet};

    use chrono::Utc;
    use sapsim_types::{ClientInfo, RequestId};

    use super::*;

    fn entry(path: &str, status_code: u16) -> RequestLogEntry {
        RequestLogEntry {
            id: RequestId::new(),
            timestamp: Utc::now(),
            method: String::from("GET"),
            path: path.to_owned(),
            query: None,
            system_id: Some(String::from("S4H")),
            module_id: Some(String::from("SD")),
            status_code,
            elapsed_ms: 1,
            headers: BTreeMap::new(),
            request_body: None,
            response_body: Some(String::from("{}")),
            client: ClientInfo::default(),
        }
    }

    #[test]
    fn never_exceeds_capacity_and_keeps_newest() {
        let monitor = RequestMonitor::new(5, 16);
        for i in 0..12 {
            monitor.log_request(entry(&format!("/r/{i}"), 200));
            assert!(monitor.get_total_request_count() <= 5);
        }

        let recent: Vec<String> = monitor
            .get_recent_requests(5)
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(recent, vec!["/r/11", "/r/10", "/r/9", "/r/8", "/r/7"]);
    }

    #[test]
    fn recent_requests_is_a_snapshot() {
        let monitor = RequestMonitor::new(10, 16);
        monitor.log_request(entry("/a", 200));
        let snapshot = monitor.get_recent_requests(10);
        monitor.log_request(entry("/b", 200));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(monitor.get_recent_requests(1).first().map(|e| e.path.as_str()), Some("/b"));
    }

    #[test]
    fn recent_requests_with_larger_count_returns_all() {
        let monitor = RequestMonitor::new(10, 16);
        monitor.log_request(entry("/a", 200));
        monitor.log_request(entry("/b", 200));
        assert_eq!(monitor.get_recent_requests(100).len(), 2);
        assert!(monitor.get_recent_requests(0).is_empty());
    }

    #[test]
    fn clear_is_idempotent() {
        let monitor = RequestMonitor::new(10, 16);
        monitor.log_request(entry("/a", 200));
        monitor.clear_requests();
        assert_eq!(monitor.get_total_request_count(), 0);
        monitor.clear_requests();
        assert_eq!(monitor.get_total_request_count(), 0);
        assert!(monitor.get_recent_requests(10).is_empty());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let monitor = RequestMonitor::new(0, 0);
        monitor.log_request(entry("/a", 200));
        monitor.log_request(entry("/b", 200));
        assert_eq!(monitor.max_requests(), 1);
        assert_eq!(monitor.get_total_request_count(), 1);
    }

    #[tokio::test]
    async fn observers_receive_entries() {
        let monitor = RequestMonitor::new(10, 16);
        let mut rx = monitor.subscribe();
        assert_eq!(monitor.observer_count(), 1);

        monitor.log_request(entry("/a", 200));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.path, "/a");
    }

    #[test]
    fn logging_without_observers_does_not_fail() {
        let monitor = RequestMonitor::new(10, 16);
        let rx = monitor.subscribe();
        drop(rx);
        monitor.log_request(entry("/a", 200));
        assert_eq!(monitor.get_total_request_count(), 1);
    }

    #[test]
    fn event_subscribers_are_called_synchronously() {
        let monitor = RequestMonitor::new(10, 16);
        let counters = RequestCounters::attach(&monitor);

        monitor.log_request(entry("/a", 200));
        monitor.log_request(entry("/b", 404));
        monitor.log_request(entry("/c", 500));
        let mut simulated = entry("/d", 408);
        simulated
            .headers
            .insert(String::from("x-simulate-error"), String::from("Timeout"));
        monitor.log_request(simulated);

        assert_eq!(
            counters.snapshot(),
            CounterSnapshot {
                total: 4,
                success: 1,
                client_errors: 2,
                server_errors: 1,
                simulated: 1,
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_logging_keeps_exactly_capacity() {
        const CAPACITY: usize = 1000;
        const WRITERS: usize = 10_000;

        let monitor = Arc::new(RequestMonitor::new(CAPACITY, 16));
        let counters = RequestCounters::attach(&monitor);

        let handles: Vec<_> = (0..WRITERS)
            .map(|i| {
                let monitor = Arc::clone(&monitor);
                tokio::spawn(async move {
                    monitor.log_request(entry(&format!("/r/{i}"), 200));
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(monitor.get_total_request_count(), CAPACITY);
        let retained = monitor.get_recent_requests(WRITERS);
        assert_eq!(retained.len(), CAPACITY);

        let ids: HashSet<RequestId> = retained.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), CAPACITY);
        assert!(retained.iter().all(|e| e.path.starts_with("/r/") && e.status_code == 200));
        assert_eq!(counters.snapshot().total, WRITERS as u64);
    }

    #[test]
    fn concurrent_clear_and_log_stay_consistent() {
        let monitor = Arc::new(RequestMonitor::new(50, 16));
        let writers: Vec<_> = (0..4)
            .map(|t| {
                let monitor = Arc::clone(&monitor);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        monitor.log_request(entry(&format!("/t{t}/{i}"), 200));
                    }
                })
            })
            .collect();
        let clearer = {
            let monitor = Arc::clone(&monitor);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    monitor.clear_requests();
                }
            })
        };

        for writer in writers {
            assert!(writer.join().is_ok());
        }
        assert!(clearer.join().is_ok());

        let retained = monitor.get_recent_requests(100);
        assert!(retained.len() <= 50);
        let ids: HashSet<RequestId> = retained.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), retained.len());
    }
}
