use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Solve counters shared across request handlers.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    solves_requested: AtomicU64,
    solves_succeeded: AtomicU64,
    validation_failures: AtomicU64,
    engine_not_found: AtomicU64,
    timeouts: AtomicU64,
    spawn_failures: AtomicU64,
    engine_failures: AtomicU64,
    parse_failures: AtomicU64,
    in_flight: AtomicU64,
    total_engine_ms: AtomicU64,
}

/// Outcome of one solve, as counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    Succeeded,
    ValidationFailed,
    EngineNotFound,
    Timeout,
    SpawnFailure,
    EngineFailure,
    ParseFailure,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a solve as started. Dropping the guard records nothing but
    /// releases the in-flight slot.
    pub fn start_solve(&self) -> InFlightGuard {
        self.inner.solves_requested.fetch_add(1, Ordering::Relaxed);
        let count = self.inner.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(in_flight = count, "solve started");
        InFlightGuard {
            metrics: self.clone(),
        }
    }

    pub fn record(&self, outcome: SolveOutcome) {
        let counter = match outcome {
            SolveOutcome::Succeeded => &self.inner.solves_succeeded,
            SolveOutcome::ValidationFailed => &self.inner.validation_failures,
            SolveOutcome::EngineNotFound => &self.inner.engine_not_found,
            SolveOutcome::Timeout => &self.inner.timeouts,
            SolveOutcome::SpawnFailure => &self.inner.spawn_failures,
            SolveOutcome::EngineFailure => &self.inner.engine_failures,
            SolveOutcome::ParseFailure => &self.inner.parse_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_engine_time(&self, millis: u64) {
        self.inner
            .total_engine_ms
            .fetch_add(millis, Ordering::Relaxed);
    }

    fn finish_in_flight(&self) {
        let mut current = self.inner.in_flight.load(Ordering::Relaxed);
        loop {
            if current == 0 {
                tracing::warn!("attempted to decrement in_flight below zero");
                return;
            }
            match self.inner.in_flight.compare_exchange(
                current,
                current - 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            solves_requested: load(&self.inner.solves_requested),
            solves_succeeded: load(&self.inner.solves_succeeded),
            validation_failures: load(&self.inner.validation_failures),
            engine_not_found: load(&self.inner.engine_not_found),
            timeouts: load(&self.inner.timeouts),
            spawn_failures: load(&self.inner.spawn_failures),
            engine_failures: load(&self.inner.engine_failures),
            parse_failures: load(&self.inner.parse_failures),
            in_flight: load(&self.inner.in_flight),
            total_engine_ms: load(&self.inner.total_engine_ms),
        }
    }

    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        tracing::info!(
            solves_requested = snapshot.solves_requested,
            solves_succeeded = snapshot.solves_succeeded,
            timeouts = snapshot.timeouts,
            parse_failures = snapshot.parse_failures,
            avg_engine_ms = snapshot.average_engine_ms(),
            "solve metrics"
        );
    }
}

/// Releases the in-flight slot taken by [`MetricsCollector::start_solve`].
#[derive(Debug)]
pub struct InFlightGuard {
    metrics: MetricsCollector,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.metrics.finish_in_flight();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub solves_requested: u64,
    pub solves_succeeded: u64,
    pub validation_failures: u64,
    pub engine_not_found: u64,
    pub timeouts: u64,
    pub spawn_failures: u64,
    pub engine_failures: u64,
    pub parse_failures: u64,
    pub in_flight: u64,
    pub total_engine_ms: u64,
}

impl MetricsSnapshot {
    /// Mean engine time over successful solves.
    pub fn average_engine_ms(&self) -> u64 {
        if self.solves_succeeded > 0 {
            self.total_engine_ms / self.solves_succeeded
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn starts_at_zero() {
        let snapshot = MetricsCollector::new().snapshot();
        assert_eq!(snapshot.solves_requested, 0);
        assert_eq!(snapshot.in_flight, 0);
        assert_eq!(snapshot.average_engine_ms(), 0);
    }

    #[test]
    fn in_flight_follows_guard_lifetime() {
        let metrics = MetricsCollector::new();
        let first = metrics.start_solve();
        let second = metrics.start_solve();
        assert_eq!(metrics.snapshot().in_flight, 2);

        drop(first);
        assert_eq!(metrics.snapshot().in_flight, 1);
        drop(second);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.in_flight, 0);
        assert_eq!(snapshot.solves_requested, 2);
    }

    #[test]
    fn outcomes_land_in_their_own_counter() {
        let metrics = MetricsCollector::new();
        metrics.record(SolveOutcome::Succeeded);
        metrics.record(SolveOutcome::Succeeded);
        metrics.record(SolveOutcome::Timeout);
        metrics.record(SolveOutcome::ParseFailure);
        metrics.record_engine_time(300);
        metrics.record_engine_time(100);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.solves_succeeded, 2);
        assert_eq!(snapshot.timeouts, 1);
        assert_eq!(snapshot.parse_failures, 1);
        assert_eq!(snapshot.engine_failures, 0);
        assert_eq!(snapshot.average_engine_ms(), 200);
    }

    #[test]
    fn log_metrics_reports_the_snapshot() {
        use crate::logging::TestLogSubscriber;
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::Registry;

        let metrics = MetricsCollector::new();
        drop(metrics.start_solve());
        metrics.record(SolveOutcome::Timeout);

        let subscriber = TestLogSubscriber::new();
        let registry = Registry::default().with(subscriber.clone().into_layer::<Registry>());
        tracing::subscriber::with_default(registry, || metrics.log_metrics());

        let entry = subscriber.find("solve metrics").expect("metrics event");
        assert_eq!(entry.field("solves_requested"), Some("1"));
        assert_eq!(entry.field("timeouts"), Some("1"));
        assert_eq!(entry.field("avg_engine_ms"), Some("0"));
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let metrics = MetricsCollector::new();
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let m = metrics.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let _guard = m.start_solve();
                        m.record(SolveOutcome::Succeeded);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.solves_requested, 1000);
        assert_eq!(snapshot.solves_succeeded, 1000);
        assert_eq!(snapshot.in_flight, 0);
    }
}
