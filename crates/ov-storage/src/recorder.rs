//! IO recorder and player: records every storage/vector call as a JSONL
//! entry and replays a recording against a (possibly different) backend to
//! compare behavior across backends deterministically.
//!
//! Grounded on [`VikingFS::append`] for the writer side — recording is just
//! appending newline-delimited JSON to a log file — and [`FileKvStore`]'s
//! read/write shape for how a batched writer is structured around a single
//! `Arc<VikingFS>`-backed file.

use std::sync::Arc;
use tokio::sync::Mutex;

use chrono::Utc;
use ov_core::error::Result;
use serde::{Deserialize, Serialize};

use crate::viking_fs::VikingFS;

/// Which subsystem a recorded call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoType {
    Fs,
    Vikingdb,
}

/// One recorded storage or vector call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedCall {
    pub timestamp: String,
    pub io_type: IoType,
    pub operation: String,
    pub request: serde_json::Value,
    pub response: serde_json::Value,
    pub latency_ms: u64,
    pub success: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub agfs_calls: Vec<String>,
}

impl RecordedCall {
    pub fn ok(io_type: IoType, operation: impl Into<String>, request: serde_json::Value, response: serde_json::Value, latency_ms: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            io_type,
            operation: operation.into(),
            request,
            response,
            latency_ms,
            success: true,
            error: None,
            agfs_calls: Vec::new(),
        }
    }

    pub fn failed(io_type: IoType, operation: impl Into<String>, request: serde_json::Value, latency_ms: u64, error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            io_type,
            operation: operation.into(),
            request,
            response: serde_json::Value::Null,
            latency_ms,
            success: false,
            error: Some(error.into()),
            agfs_calls: Vec::new(),
        }
    }
}

/// Batches recorded calls and flushes them to a JSONL log, either when the
/// batch reaches `batch_size` or when `flush_interval_ms` has elapsed since
/// the last flush (checked on every `record` call — there is no background
/// timer, so a quiet recorder simply flushes on the next call after expiry).
pub struct Recorder {
    vfs: Arc<VikingFS>,
    log_uri: String,
    batch_size: usize,
    flush_interval_ms: u64,
    buffer: Mutex<Vec<RecordedCall>>,
    last_flush: Mutex<std::time::Instant>,
}

impl Recorder {
    pub fn new(vfs: Arc<VikingFS>, log_uri: impl Into<String>, batch_size: usize, flush_interval_ms: u64) -> Self {
        Self {
            vfs,
            log_uri: log_uri.into(),
            batch_size: batch_size.max(1),
            flush_interval_ms,
            buffer: Mutex::new(Vec::new()),
            last_flush: Mutex::new(std::time::Instant::now()),
        }
    }

    /// Record one call, flushing the batch if it's now full or the flush
    /// interval has elapsed since the last flush.
    pub async fn record(&self, call: RecordedCall) -> Result<()> {
        let mut buf = self.buffer.lock().await;
        buf.push(call);
        let due = {
            let last = self.last_flush.lock().await;
            last.elapsed().as_millis() as u64 >= self.flush_interval_ms
        };
        if buf.len() >= self.batch_size || due {
            self.flush_locked(&mut buf).await?;
        }
        Ok(())
    }

    /// Force a flush regardless of batch size or interval.
    pub async fn flush(&self) -> Result<()> {
        let mut buf = self.buffer.lock().await;
        self.flush_locked(&mut buf).await
    }

    async fn flush_locked(&self, buf: &mut Vec<RecordedCall>) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        let mut lines = String::new();
        for call in buf.iter() {
            lines.push_str(&serde_json::to_string(call).map_err(ov_core::error::OvError::Serialization)?);
            lines.push('\n');
        }
        self.vfs.append(&self.log_uri, &lines).await?;
        buf.clear();
        *self.last_flush.lock().await = std::time::Instant::now();
        Ok(())
    }

    pub async fn pending_count(&self) -> usize {
        self.buffer.lock().await.len()
    }
}

/// Canonicalized error phrases the player treats as equivalent across
/// backends, regardless of exact wording.
const ERROR_EQUIVALENCE_CLASSES: &[(&str, &[&str])] = &[
    ("no-such-file", &["no such file", "not found", "does not exist", "nosuchkey"]),
    ("not-a-directory", &["not a directory", "notadirectory"]),
    ("is-a-directory", &["is a directory", "isadirectory"]),
    ("permission-denied", &["permission denied", "forbidden", "access denied"]),
    ("already-exists", &["already exists", "alreadyexists", "conflict"]),
    ("not-empty", &["not empty", "directory not empty"]),
    ("timeout", &["timed out", "timeout", "deadline exceeded"]),
    ("connection-refused", &["connection refused", "econnrefused"]),
    ("stat-failed", &["stat failed", "failed to stat"]),
];

fn canonical_class(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    ERROR_EQUIVALENCE_CLASSES
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| lower.contains(p)))
        .map(|(class, _)| *class)
}

/// Two error messages are equivalent if they fall in the same canonicalized
/// class, or if neither matches any known class and they're byte-identical
/// (an unrecognized error still has to match verbatim to count as a pass).
fn errors_match(a: &str, b: &str) -> bool {
    match (canonical_class(a), canonical_class(b)) {
        (Some(ca), Some(cb)) => ca == cb,
        _ => a == b,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationStats {
    pub count: usize,
    pub orig_total_ms: u64,
    pub play_total_ms: u64,
    pub matches: usize,
}

impl OperationStats {
    pub fn orig_avg_ms(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.orig_total_ms as f64 / self.count as f64 }
    }

    pub fn play_avg_ms(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.play_total_ms as f64 / self.count as f64 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayReport {
    pub total: usize,
    pub success_count: usize,
    pub per_operation: std::collections::HashMap<String, OperationStats>,
}

impl ReplayReport {
    /// `speedup_ratio = Σorig/Σplay` across every replayed call.
    pub fn speedup_ratio(&self) -> f64 {
        let (orig, play) = self
            .per_operation
            .values()
            .fold((0u64, 0u64), |(o, p), s| (o + s.orig_total_ms, p + s.play_total_ms));
        if play == 0 {
            return f64::INFINITY;
        }
        orig as f64 / play as f64
    }
}

/// Result of replaying a single call.
pub struct LiveResult {
    pub response: serde_json::Value,
    pub latency_ms: u64,
    pub success: bool,
    pub error: Option<String>,
}

/// Reads back a recorded JSONL log and replays each call through a closure,
/// comparing the live result against the recorded one.
pub struct Player {
    vfs: Arc<VikingFS>,
    log_uri: String,
}

impl Player {
    pub fn new(vfs: Arc<VikingFS>, log_uri: impl Into<String>) -> Self {
        Self { vfs, log_uri: log_uri.into() }
    }

    pub async fn load(&self) -> Result<Vec<RecordedCall>> {
        let content = self.vfs.read_string(&self.log_uri).await?;
        let mut calls = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let call: RecordedCall =
                serde_json::from_str(line).map_err(ov_core::error::OvError::Serialization)?;
            calls.push(call);
        }
        Ok(calls)
    }

    /// Replay each recorded call through `replay_fn`, which re-executes the
    /// operation and returns its live result. Optionally restrict the
    /// replayed set by `io_type`/`operation` filters.
    pub async fn replay<F>(
        &self,
        io_type_filter: Option<IoType>,
        operation_filter: Option<&str>,
        mut replay_fn: F,
    ) -> Result<ReplayReport>
    where
        F: FnMut(&RecordedCall) -> LiveResult,
    {
        let calls = self.load().await?;
        let mut report = ReplayReport::default();

        for call in &calls {
            if let Some(io) = io_type_filter {
                if call.io_type != io {
                    continue;
                }
            }
            if let Some(op) = operation_filter {
                if call.operation != op {
                    continue;
                }
            }

            report.total += 1;
            let live = replay_fn(call);
            let stats = report.per_operation.entry(call.operation.clone()).or_default();
            stats.count += 1;
            stats.orig_total_ms += call.latency_ms;
            stats.play_total_ms += live.latency_ms;

            let matched = match (call.success, live.success) {
                (true, true) => call.response == live.response,
                (false, false) => {
                    let recorded_err = call.error.as_deref().unwrap_or("");
                    let live_err = live.error.as_deref().unwrap_or("");
                    errors_match(recorded_err, live_err)
                }
                _ => false,
            };

            if matched {
                stats.matches += 1;
                report.success_count += 1;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn make_vfs() -> (TempDir, Arc<VikingFS>) {
        let tmp = TempDir::new().unwrap();
        let vfs = Arc::new(VikingFS::new(tmp.path()));
        (tmp, vfs)
    }

    #[tokio::test]
    async fn flushes_on_batch_size() {
        let (_tmp, vfs) = make_vfs();
        vfs.mkdir("viking://logs").await.unwrap();
        let rec = Recorder::new(vfs.clone(), "viking://logs/trace.jsonl", 2, 60_000);
        rec.record(RecordedCall::ok(IoType::Fs, "read", json!({"uri": "a"}), json!({"ok": true}), 5))
            .await
            .unwrap();
        assert_eq!(rec.pending_count().await, 1);
        rec.record(RecordedCall::ok(IoType::Fs, "read", json!({"uri": "b"}), json!({"ok": true}), 5))
            .await
            .unwrap();
        assert_eq!(rec.pending_count().await, 0);
        let content = vfs.read_string("viking://logs/trace.jsonl").await.unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[tokio::test]
    async fn manual_flush_writes_partial_batch() {
        let (_tmp, vfs) = make_vfs();
        vfs.mkdir("viking://logs").await.unwrap();
        let rec = Recorder::new(vfs.clone(), "viking://logs/trace.jsonl", 10, 60_000);
        rec.record(RecordedCall::ok(IoType::Fs, "write", json!({"uri": "a"}), json!({"ok": true}), 3))
            .await
            .unwrap();
        rec.flush().await.unwrap();
        assert_eq!(rec.pending_count().await, 0);
        let content = vfs.read_string("viking://logs/trace.jsonl").await.unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[tokio::test]
    async fn flushes_when_interval_elapsed() {
        let (_tmp, vfs) = make_vfs();
        vfs.mkdir("viking://logs").await.unwrap();
        let rec = Recorder::new(vfs.clone(), "viking://logs/trace.jsonl", 100, 0);
        rec.record(RecordedCall::ok(IoType::Fs, "read", json!({}), json!({}), 1)).await.unwrap();
        assert_eq!(rec.pending_count().await, 1);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        rec.record(RecordedCall::ok(IoType::Fs, "read", json!({}), json!({}), 1)).await.unwrap();
        assert_eq!(rec.pending_count().await, 0);
    }

    #[tokio::test]
    async fn player_replays_and_reports_matches() {
        let (_tmp, vfs) = make_vfs();
        vfs.mkdir("viking://logs").await.unwrap();
        let rec = Recorder::new(vfs.clone(), "viking://logs/trace.jsonl", 1, 60_000);
        rec.record(RecordedCall::ok(IoType::Fs, "read", json!({"k": "a"}), json!({"v": 1}), 10)).await.unwrap();
        rec.record(RecordedCall::ok(IoType::Fs, "read", json!({"k": "b"}), json!({"v": 2}), 10)).await.unwrap();

        let player = Player::new(vfs, "viking://logs/trace.jsonl");
        let report = player
            .replay(None, None, |call| {
                if call.request["k"] == "a" {
                    LiveResult { response: json!({"v": 1}), latency_ms: 1, success: true, error: None }
                } else {
                    LiveResult { response: json!({"v": 999}), latency_ms: 1, success: true, error: None }
                }
            })
            .await
            .unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.success_count, 1);
        assert!(report.speedup_ratio() > 1.0);
    }

    #[tokio::test]
    async fn player_treats_equivalent_errors_as_matching() {
        let (_tmp, vfs) = make_vfs();
        vfs.mkdir("viking://logs").await.unwrap();
        let rec = Recorder::new(vfs.clone(), "viking://logs/trace.jsonl", 1, 60_000);
        rec.record(RecordedCall::failed(IoType::Fs, "read", json!({}), 2, "No such file or directory (os error 2)"))
            .await
            .unwrap();

        let player = Player::new(vfs, "viking://logs/trace.jsonl");
        let report = player
            .replay(None, None, |_call| LiveResult {
                response: serde_json::Value::Null,
                latency_ms: 1,
                success: false,
                error: Some("key not found".into()),
            })
            .await
            .unwrap();
        assert_eq!(report.success_count, 1);
    }

    #[tokio::test]
    async fn player_filters_by_io_type_and_operation() {
        let (_tmp, vfs) = make_vfs();
        vfs.mkdir("viking://logs").await.unwrap();
        let rec = Recorder::new(vfs.clone(), "viking://logs/trace.jsonl", 1, 60_000);
        rec.record(RecordedCall::ok(IoType::Fs, "read", json!({}), json!({}), 1)).await.unwrap();
        rec.record(RecordedCall::ok(IoType::Vikingdb, "search", json!({}), json!({}), 1)).await.unwrap();

        let player = Player::new(vfs, "viking://logs/trace.jsonl");
        let report = player
            .replay(Some(IoType::Vikingdb), None, |_call| LiveResult {
                response: json!({}),
                latency_ms: 1,
                success: true,
                error: None,
            })
            .await
            .unwrap();
        assert_eq!(report.total, 1);
    }

    #[test]
    fn error_equivalence_classes_match_across_wording() {
        assert!(errors_match("No such file or directory", "key not found"));
        assert!(errors_match("Permission denied", "access denied by policy"));
        assert!(!errors_match("Permission denied", "connection refused"));
    }
}
