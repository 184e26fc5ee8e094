//! In-process batch-window metrics.
//!
//! Observation only: the collector sits outside the consensus path, keeps a
//! bounded FIFO of windows, and must never influence action results. Its
//! snapshot timestamps come from the wall clock and are non-deterministic.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use veil_types::MarketId;

const DEFAULT_MAX_WINDOWS: usize = 200_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub market_id: String,
    pub window_id: u64,

    pub batch_size_hint: u32,

    pub commit_count: u32,
    pub reveal_count: u32,

    pub first_commit_at_ms: i64,
    pub last_commit_at_ms: i64,
    pub window_close_at_ms: i64,

    pub proof_submitted_at_ms: i64,
    pub clear_accepted_at_ms: i64,

    pub witness_build_ms: i64,
    pub proof_generation_ms: i64,
    pub proof_verification_ms: i64,

    pub batch_freeze_ms: i64,
    pub proof_submit_latency_ms: i64,
    pub block_accept_latency_ms: i64,

    pub commit_exec_us: u64,
    pub reveal_exec_us: u64,
    pub proof_submit_exec_us: u64,
    pub clear_exec_us: u64,

    pub missed_deadline: bool,
    pub rejected: bool,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub last_error: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_windows_observed: u64,
    pub total_commits: u64,
    pub total_reveals: u64,
    pub total_proof_submissions: u64,
    pub total_proof_submission_errors: u64,
    pub total_clears: u64,
    pub total_clear_errors: u64,
    pub total_accepted_batches: u64,
    pub total_rejected_batches: u64,
    pub total_missed_proof_deadlines: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub generated_at_ms: i64,
    pub summary: MetricsSummary,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub windows: Vec<WindowMetrics>,
}

#[derive(Debug, Default)]
struct CollectorInner {
    windows: HashMap<String, WindowMetrics>,
    order: Vec<String>,
    summary: MetricsSummary,
}

/// Lock-protected collector with a bounded FIFO of windows.
#[derive(Debug)]
pub struct MetricsCollector {
    max_windows: usize,
    inner: Mutex<CollectorInner>,
}

fn window_key(market_id: &MarketId, window_id: u64) -> String {
    let mut key = String::with_capacity(64 + 1 + 20);
    for byte in market_id.as_bytes() {
        key.push_str(&format!("{byte:02x}"));
    }
    key.push(':');
    key.push_str(&window_id.to_string());
    key
}

impl MetricsCollector {
    pub fn new(max_windows: usize) -> Self {
        Self {
            max_windows,
            inner: Mutex::new(CollectorInner {
                windows: HashMap::with_capacity(1024),
                order: Vec::with_capacity(1024),
                ..Default::default()
            }),
        }
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.windows = HashMap::with_capacity(1024);
        inner.order.clear();
        inner.summary = MetricsSummary::default();
    }

    fn get_or_create<'a>(
        inner: &'a mut CollectorInner,
        max_windows: usize,
        market_id: &MarketId,
        window_id: u64,
    ) -> &'a mut WindowMetrics {
        let key = window_key(market_id, window_id);
        if !inner.windows.contains_key(&key) {
            if max_windows > 0 && inner.order.len() >= max_windows {
                let oldest = inner.order.remove(0);
                inner.windows.remove(&oldest);
            }
            inner.windows.insert(
                key.clone(),
                WindowMetrics {
                    market_id: key[..64].to_string(),
                    window_id,
                    ..Default::default()
                },
            );
            inner.order.push(key.clone());
            inner.summary.total_windows_observed += 1;
        }
        inner.windows.get_mut(&key).expect("window just inserted")
    }

    pub fn record_commit(
        &self,
        market_id: &MarketId,
        window_id: u64,
        timestamp_ms: i64,
        exec: Duration,
        err: Option<&str>,
    ) {
        let mut inner = self.inner.lock();
        let max = self.max_windows;
        let w = Self::get_or_create(&mut inner, max, market_id, window_id);
        w.commit_exec_us += exec.as_micros() as u64;
        if let Some(err) = err {
            w.rejected = true;
            w.last_error = err.to_string();
            return;
        }
        w.commit_count += 1;
        if w.first_commit_at_ms == 0 || timestamp_ms < w.first_commit_at_ms {
            w.first_commit_at_ms = timestamp_ms;
        }
        if timestamp_ms > w.last_commit_at_ms {
            w.last_commit_at_ms = timestamp_ms;
        }
        inner.summary.total_commits += 1;
    }

    pub fn record_reveal(
        &self,
        market_id: &MarketId,
        window_id: u64,
        exec: Duration,
        err: Option<&str>,
    ) {
        let mut inner = self.inner.lock();
        let max = self.max_windows;
        let w = Self::get_or_create(&mut inner, max, market_id, window_id);
        w.reveal_exec_us += exec.as_micros() as u64;
        if let Some(err) = err {
            w.rejected = true;
            w.last_error = err.to_string();
            return;
        }
        w.reveal_count += 1;
        inner.summary.total_reveals += 1;
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record_proof_submit(
        &self,
        market_id: &MarketId,
        window_id: u64,
        window_close_at_ms: i64,
        submitted_at_ms: i64,
        exec: Duration,
        missed_deadline: bool,
        err: Option<&str>,
    ) {
        let mut inner = self.inner.lock();
        let max = self.max_windows;
        let w = Self::get_or_create(&mut inner, max, market_id, window_id);
        w.proof_submit_exec_us += exec.as_micros() as u64;
        if window_close_at_ms > 0 {
            w.window_close_at_ms = window_close_at_ms;
        }
        if submitted_at_ms > 0 {
            w.proof_submitted_at_ms = submitted_at_ms;
        }
        if missed_deadline {
            w.missed_deadline = true;
            inner.summary.total_missed_proof_deadlines += 1;
        }
        if let Some(err) = err {
            let w = Self::get_or_create(&mut inner, max, market_id, window_id);
            w.rejected = true;
            w.last_error = err.to_string();
            inner.summary.total_proof_submission_errors += 1;
            return;
        }
        inner.summary.total_proof_submissions += 1;
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record_clear(
        &self,
        market_id: &MarketId,
        window_id: u64,
        accepted_at_ms: i64,
        verify_duration: Duration,
        exec: Duration,
        missed_deadline: bool,
        err: Option<&str>,
    ) {
        let mut inner = self.inner.lock();
        let max = self.max_windows;
        let w = Self::get_or_create(&mut inner, max, market_id, window_id);
        w.clear_exec_us += exec.as_micros() as u64;
        if !verify_duration.is_zero() {
            w.proof_verification_ms = verify_duration.as_millis() as i64;
        }
        if missed_deadline {
            w.missed_deadline = true;
            inner.summary.total_missed_proof_deadlines += 1;
        }
        if let Some(err) = err {
            let w = Self::get_or_create(&mut inner, max, market_id, window_id);
            w.rejected = true;
            w.last_error = err.to_string();
            inner.summary.total_clear_errors += 1;
            inner.summary.total_rejected_batches += 1;
            return;
        }
        let w = Self::get_or_create(&mut inner, max, market_id, window_id);
        w.clear_accepted_at_ms = accepted_at_ms;
        inner.summary.total_clears += 1;
        inner.summary.total_accepted_batches += 1;
    }

    /// Off-chain prover stage timings reported out of band.
    pub fn record_prover_stages(
        &self,
        market_id: &MarketId,
        window_id: u64,
        batch_size_hint: u32,
        witness_build_ms: i64,
        proof_generation_ms: i64,
    ) {
        let mut inner = self.inner.lock();
        let max = self.max_windows;
        let w = Self::get_or_create(&mut inner, max, market_id, window_id);
        if batch_size_hint > 0 {
            w.batch_size_hint = batch_size_hint;
        }
        if witness_build_ms >= 0 {
            w.witness_build_ms = witness_build_ms;
        }
        if proof_generation_ms >= 0 {
            w.proof_generation_ms = proof_generation_ms;
        }
    }

    pub fn snapshot(&self, limit: usize, include_windows: bool) -> MetricsSnapshot {
        let inner = self.inner.lock();
        let generated_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();
        let mut snap = MetricsSnapshot {
            generated_at_ms,
            summary: inner.summary,
            windows: Vec::new(),
        };
        if !include_windows {
            return snap;
        }

        let keys: &[String] = if limit > 0 && inner.order.len() > limit {
            &inner.order[inner.order.len() - limit..]
        } else {
            &inner.order
        };
        snap.windows.reserve(keys.len());
        for key in keys {
            let Some(w) = inner.windows.get(key) else {
                continue;
            };
            let mut w = w.clone();
            if w.window_close_at_ms > 0
                && w.first_commit_at_ms > 0
                && w.window_close_at_ms >= w.first_commit_at_ms
            {
                w.batch_freeze_ms = w.window_close_at_ms - w.first_commit_at_ms;
            }
            if w.window_close_at_ms > 0 && w.proof_submitted_at_ms >= w.window_close_at_ms {
                w.proof_submit_latency_ms = w.proof_submitted_at_ms - w.window_close_at_ms;
            }
            if w.window_close_at_ms > 0 && w.clear_accepted_at_ms >= w.window_close_at_ms {
                w.block_accept_latency_ms = w.clear_accepted_at_ms - w.window_close_at_ms;
            }
            snap.windows.push(w);
        }
        snap
    }
}

static COLLECTOR: Lazy<MetricsCollector> =
    Lazy::new(|| MetricsCollector::new(DEFAULT_MAX_WINDOWS));

pub fn collector() -> &'static MetricsCollector {
    &COLLECTOR
}

pub fn reset() {
    COLLECTOR.reset();
}

pub fn snapshot(limit: usize, include_windows: bool) -> MetricsSnapshot {
    COLLECTOR.snapshot(limit, include_windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_types::ID_LEN;

    fn market(b: u8) -> MarketId {
        MarketId([b; ID_LEN])
    }

    #[test]
    fn commit_and_clear_accumulate() {
        let c = MetricsCollector::new(16);
        let m = market(1);

        c.record_commit(&m, 1, 1_000, Duration::from_micros(5), None);
        c.record_commit(&m, 1, 900, Duration::from_micros(5), None);
        c.record_proof_submit(&m, 1, 5_000, 6_000, Duration::ZERO, false, None);
        c.record_clear(&m, 1, 7_000, Duration::from_millis(3), Duration::ZERO, false, None);

        let snap = c.snapshot(0, true);
        assert_eq!(snap.summary.total_commits, 2);
        assert_eq!(snap.summary.total_proof_submissions, 1);
        assert_eq!(snap.summary.total_accepted_batches, 1);
        assert_eq!(snap.windows.len(), 1);

        let w = &snap.windows[0];
        assert_eq!(w.commit_count, 2);
        assert_eq!(w.first_commit_at_ms, 900);
        assert_eq!(w.last_commit_at_ms, 1_000);
        // Derived latencies.
        assert_eq!(w.batch_freeze_ms, 5_000 - 900);
        assert_eq!(w.proof_submit_latency_ms, 1_000);
        assert_eq!(w.block_accept_latency_ms, 2_000);
        assert_eq!(w.proof_verification_ms, 3);
    }

    #[test]
    fn errors_mark_rejection() {
        let c = MetricsCollector::new(16);
        let m = market(2);

        c.record_clear(
            &m,
            1,
            0,
            Duration::ZERO,
            Duration::ZERO,
            true,
            Some("proof deadline missed"),
        );
        let snap = c.snapshot(0, true);
        assert_eq!(snap.summary.total_clear_errors, 1);
        assert_eq!(snap.summary.total_rejected_batches, 1);
        assert_eq!(snap.summary.total_missed_proof_deadlines, 1);
        let w = &snap.windows[0];
        assert!(w.rejected);
        assert!(w.missed_deadline);
        assert_eq!(w.last_error, "proof deadline missed");
    }

    #[test]
    fn fifo_bounds_window_count() {
        let c = MetricsCollector::new(2);
        for i in 0..4u8 {
            c.record_commit(&market(i), 0, 1, Duration::ZERO, None);
        }
        let snap = c.snapshot(0, true);
        assert_eq!(snap.windows.len(), 2);
        assert_eq!(snap.summary.total_windows_observed, 4);
        // Oldest windows were evicted.
        assert!(snap.windows[0].market_id.starts_with("02"));
    }

    #[test]
    fn snapshot_limit_takes_newest() {
        let c = MetricsCollector::new(16);
        for i in 0..5u64 {
            c.record_commit(&market(9), i, 1, Duration::ZERO, None);
        }
        let snap = c.snapshot(2, true);
        assert_eq!(snap.windows.len(), 2);
        assert_eq!(snap.windows[0].window_id, 3);
        assert_eq!(snap.windows[1].window_id, 4);
    }
}
