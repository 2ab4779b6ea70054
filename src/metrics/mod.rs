use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Label for one low-level database call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OpLabel {
    /// A single-row execute of the prepared insert.
    RowInsert,
    /// One flush of queued rows, executed as a unit.
    BatchExecute,
}

impl OpLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            OpLabel::RowInsert => "row-insert",
            OpLabel::BatchExecute => "batch-execute",
        }
    }
}

impl fmt::Display for OpLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of a single execute or batch-execute call.
#[derive(Debug, Clone)]
struct ExecutionRecord {
    label: OpLabel,
    elapsed: Duration,
    ok: bool,
}

/// Accumulates per-call timings for one load invocation. Each load owns its
/// own recorder; there is no process-wide monitor. Recording order is call
/// order, and the recorder is not shared across threads.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    records: Vec<ExecutionRecord>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, recording its elapsed time and outcome under `label`.
    /// The result is handed back untouched.
    pub fn time<T, E>(
        &mut self,
        label: OpLabel,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        let start = Instant::now();
        let out = f();
        self.records.push(ExecutionRecord {
            label,
            elapsed: start.elapsed(),
            ok: out.is_ok(),
        });
        out
    }

    /// Number of calls recorded under `label` so far.
    pub fn count(&self, label: OpLabel) -> usize {
        self.records.iter().filter(|r| r.label == label).count()
    }

    /// Fold all records into a per-label report.
    pub fn summarize(&self) -> LoadReport {
        let mut ops: BTreeMap<String, OpStats> = BTreeMap::new();
        for rec in &self.records {
            let stats = ops.entry(rec.label.as_str().to_string()).or_default();
            stats.calls += 1;
            if !rec.ok {
                stats.failures += 1;
            }
            stats.total += rec.elapsed;
            stats.min = match stats.calls {
                1 => rec.elapsed,
                _ => stats.min.min(rec.elapsed),
            };
            stats.max = stats.max.max(rec.elapsed);
        }
        for stats in ops.values_mut() {
            stats.mean = stats.total / stats.calls as u32;
        }
        LoadReport { ops }
    }
}

fn serialize_ms<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1e3)
}

/// Aggregate timings for all calls sharing one label.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OpStats {
    pub calls: usize,
    pub failures: usize,
    #[serde(serialize_with = "serialize_ms", rename = "total_ms")]
    pub total: Duration,
    #[serde(serialize_with = "serialize_ms", rename = "mean_ms")]
    pub mean: Duration,
    #[serde(serialize_with = "serialize_ms", rename = "min_ms")]
    pub min: Duration,
    #[serde(serialize_with = "serialize_ms", rename = "max_ms")]
    pub max: Duration,
}

/// Per-label summary of one load. Created fresh per load call and immutable
/// once returned; labels with no recorded calls have no entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub ops: BTreeMap<String, OpStats>,
}

impl LoadReport {
    /// Calls recorded under `label`, 0 if the label never fired.
    pub fn calls(&self, label: OpLabel) -> usize {
        self.ops.get(label.as_str()).map_or(0, |s| s.calls)
    }

    /// Total calls across all labels.
    pub fn total_calls(&self) -> usize {
        self.ops.values().map(|s| s.calls).sum()
    }

    /// Wall time spent inside the database across all labels.
    pub fn total_elapsed(&self) -> Duration {
        self.ops.values().map(|s| s.total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_passes_results_through_and_records() {
        let mut metrics = MetricsRecorder::new();

        let ok: Result<usize, ()> = metrics.time(OpLabel::RowInsert, || Ok(1));
        assert_eq!(ok.unwrap(), 1);

        let err: Result<(), &str> = metrics.time(OpLabel::RowInsert, || Err("boom"));
        assert!(err.is_err());

        assert_eq!(metrics.count(OpLabel::RowInsert), 2);
        assert_eq!(metrics.count(OpLabel::BatchExecute), 0);
    }

    #[test]
    fn summarize_aggregates_per_label() {
        let mut metrics = MetricsRecorder::new();
        for i in 0..3 {
            let _: Result<usize, ()> = metrics.time(OpLabel::RowInsert, || Ok(i));
        }
        let _: Result<(), ()> = metrics.time(OpLabel::BatchExecute, || Ok(()));
        let _: Result<(), &str> = metrics.time(OpLabel::BatchExecute, || Err("boom"));

        let report = metrics.summarize();
        assert_eq!(report.calls(OpLabel::RowInsert), 3);
        assert_eq!(report.calls(OpLabel::BatchExecute), 2);
        assert_eq!(report.total_calls(), 5);

        let batch = &report.ops["batch-execute"];
        assert_eq!(batch.failures, 1);
        assert!(batch.min <= batch.max);
        assert!(batch.total >= batch.max);

        let inserts = &report.ops["row-insert"];
        assert_eq!(report.total_elapsed(), batch.total + inserts.total);
    }

    #[test]
    fn empty_recorder_summarizes_to_zero_ops() {
        let report = MetricsRecorder::new().summarize();
        assert_eq!(report.total_calls(), 0);
        assert_eq!(report.total_elapsed(), Duration::ZERO);
        assert!(report.ops.is_empty());
    }
}
