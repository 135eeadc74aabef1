//! Cache metrics
//!
//! Counters are emitted through the `metrics` facade; nothing is recorded
//! until the application installs a recorder.

use std::time::Duration;

use metrics::{counter, histogram};

/// Result of looking up a call in the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// A valid output record was served
    Hit,
    /// A stored fault was replayed without executing
    FaultReplayed,
    /// Nothing usable was stored; the function runs
    Miss,
}

impl LookupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::FaultReplayed => "fault_replayed",
            Self::Miss => "miss",
        }
    }
}

/// Record a cache lookup
pub fn record_lookup(function: &str, outcome: LookupOutcome) {
    let labels = [
        ("function", function.to_string()),
        ("outcome", outcome.as_str().to_string()),
    ];

    counter!("memokit_lookups_total", &labels).increment(1);

    match outcome {
        LookupOutcome::Hit => counter!("memokit_cache_hits_total", "function" => function.to_string()).increment(1),
        LookupOutcome::Miss => counter!("memokit_cache_misses_total", "function" => function.to_string()).increment(1),
        LookupOutcome::FaultReplayed => counter!("memokit_faults_replayed_total", "function" => function.to_string()).increment(1),
    }
}

/// Record one execution of a wrapped function after a miss
pub fn record_execution(function: &str, duration: Duration, success: bool) {
    let labels = [
        ("function", function.to_string()),
        ("status", if success { "success" } else { "error" }.to_string()),
    ];

    counter!("memokit_executions_total", &labels).increment(1);
    histogram!("memokit_execution_duration_seconds", &labels).record(duration.as_secs_f64());

    if !success {
        counter!("memokit_faults_captured_total", "function" => function.to_string()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    fn counters_after(record: impl FnOnce()) -> HashMap<String, u64> {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, record);

        let mut totals = HashMap::new();
        for (key, _, _, value) in snapshotter.snapshot().into_vec() {
            if let DebugValue::Counter(count) = value {
                *totals.entry(key.key().name().to_string()).or_insert(0) += count;
            }
        }
        totals
    }

    #[test]
    fn test_lookup_outcome_labels() {
        assert_eq!(LookupOutcome::Hit.as_str(), "hit");
        assert_eq!(LookupOutcome::FaultReplayed.as_str(), "fault_replayed");
        assert_eq!(LookupOutcome::Miss.as_str(), "miss");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_lookup("demo.add", LookupOutcome::Hit);
        record_execution("demo.add", Duration::from_millis(5), false);
    }

    #[test]
    fn test_counters_per_outcome() {
        let counters = counters_after(|| {
            record_lookup("demo.add", LookupOutcome::Hit);
            record_lookup("demo.add", LookupOutcome::Hit);
            record_lookup("demo.add", LookupOutcome::Miss);
            record_lookup("demo.add", LookupOutcome::FaultReplayed);
            record_execution("demo.add", Duration::from_millis(5), true);
            record_execution("demo.add", Duration::from_millis(5), false);
        });

        assert_eq!(counters.get("memokit_lookups_total"), Some(&4));
        assert_eq!(counters.get("memokit_cache_hits_total"), Some(&2));
        assert_eq!(counters.get("memokit_cache_misses_total"), Some(&1));
        assert_eq!(counters.get("memokit_faults_replayed_total"), Some(&1));
        assert_eq!(counters.get("memokit_executions_total"), Some(&2));
        assert_eq!(counters.get("memokit_faults_captured_total"), Some(&1));
    }
}
