//! Per-request trace collector: events, counters, gauges, with a bounded
//! event budget and a drop-on-overflow discipline.
//!
//! Bound into the call context for the lifetime of one HTTP handler. Unlike
//! the source's global `trace_collector`, this is an explicit object the
//! handler owns (usually via `Arc`) and passes down — never a process-wide
//! static.

use crate::error::ErrorCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

const DEFAULT_MAX_EVENTS: usize = 500;

/// One recorded trace event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub stage: String,
    pub name: String,
    #[serde(default)]
    pub attrs: HashMap<String, serde_json::Value>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ErrorInfo {
    pub stage: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VectorSummary {
    pub search_calls: u64,
    pub candidates_returned: u64,
    pub candidates_scanned: u64,
    pub returned: u64,
    pub vectors_scanned: u64,
    pub scan_unavailable_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SemanticNodesSummary {
    pub total: u64,
    pub done: u64,
    pub pending: u64,
    pub in_progress: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MemorySummary {
    pub memories_extracted: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

/// The normalized, serializable summary returned by `finish()`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TraceSummary {
    pub status: String,
    pub token_usage: TokenUsage,
    pub vector: VectorSummary,
    pub semantic_nodes: SemanticNodesSummary,
    pub memory: MemorySummary,
    pub errors: Option<ErrorInfo>,
    pub counters: HashMap<String, i64>,
    pub gauges: HashMap<String, serde_json::Value>,
    pub dropped_events: u64,
    pub events_truncated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceResult {
    pub summary: TraceSummary,
    pub events: Vec<TraceEvent>,
}

#[derive(Debug, Default)]
struct Inner {
    events: Vec<TraceEvent>,
    counters: HashMap<String, i64>,
    gauges: HashMap<String, serde_json::Value>,
    token_in: u64,
    token_out: u64,
    error: Option<ErrorInfo>,
    dropped_events: u64,
}

/// Per-request trace collector. Cheap to construct; `enabled: false` makes
/// every method a near-no-op (events are simply not retained, counters are
/// dropped on the floor) so call sites don't need to branch on the caller's
/// `trace: bool` opt-in.
#[derive(Debug)]
pub struct TraceCollector {
    enabled: bool,
    max_events: usize,
    inner: Mutex<Inner>,
}

impl TraceCollector {
    pub fn new(enabled: bool) -> Self {
        Self::with_max_events(enabled, DEFAULT_MAX_EVENTS)
    }

    pub fn with_max_events(enabled: bool, max_events: usize) -> Self {
        Self {
            enabled,
            max_events,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn event(&self, stage: impl Into<String>, name: impl Into<String>, status: impl Into<String>) {
        self.event_with_attrs(stage, name, HashMap::new(), status)
    }

    pub fn event_with_attrs(
        &self,
        stage: impl Into<String>,
        name: impl Into<String>,
        attrs: HashMap<String, serde_json::Value>,
        status: impl Into<String>,
    ) {
        if !self.enabled {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.events.len() >= self.max_events {
            inner.dropped_events += 1;
            return;
        }
        inner.events.push(TraceEvent {
            stage: stage.into(),
            name: name.into(),
            attrs,
            status: status.into(),
        });
    }

    pub fn count(&self, key: impl Into<String>, delta: i64) {
        if !self.enabled {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        *inner.counters.entry(key.into()).or_insert(0) += delta;
    }

    pub fn set(&self, key: impl Into<String>, value: serde_json::Value) {
        if !self.enabled {
            return;
        }
        self.inner.lock().unwrap().gauges.insert(key.into(), value);
    }

    pub fn add_token_usage(&self, input: u64, output: u64) {
        if !self.enabled {
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        inner.token_in += input;
        inner.token_out += output;
    }

    pub fn set_error(&self, stage: impl Into<String>, code: ErrorCode, message: impl Into<String>) {
        if !self.enabled {
            return;
        }
        self.inner.lock().unwrap().error = Some(ErrorInfo {
            stage: stage.into(),
            code: code.as_str().to_string(),
            message: message.into(),
        });
    }

    /// Finalize and drain the collector into a [`TraceResult`].
    pub fn finish(&self, status: impl Into<String>) -> TraceResult {
        if !self.enabled {
            return TraceResult {
                summary: TraceSummary::default(),
                events: Vec::new(),
            };
        }
        let inner = self.inner.lock().unwrap();
        let events_truncated = inner.dropped_events > 0;
        let summary = TraceSummary {
            status: status.into(),
            token_usage: TokenUsage {
                input: inner.token_in,
                output: inner.token_out,
            },
            vector: Self::vector_summary(&inner),
            semantic_nodes: SemanticNodesSummary::default(),
            memory: MemorySummary {
                memories_extracted: *inner.counters.get("memories_extracted").unwrap_or(&0) as u64,
            },
            errors: inner.error.clone(),
            counters: inner.counters.clone(),
            gauges: inner.gauges.clone(),
            dropped_events: inner.dropped_events,
            events_truncated,
        };
        TraceResult {
            summary,
            events: inner.events.clone(),
        }
    }

    fn vector_summary(inner: &Inner) -> VectorSummary {
        let g = |k: &str| *inner.counters.get(k).unwrap_or(&0) as u64;
        VectorSummary {
            search_calls: g("vector.search_calls"),
            candidates_returned: g("vector.candidates_returned"),
            candidates_scanned: g("vector.candidates_scanned"),
            returned: g("vector.returned"),
            vectors_scanned: g("vector.vectors_scanned"),
            scan_unavailable_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_collector_is_noop() {
        let tc = TraceCollector::new(false);
        tc.event("search", "roots", "ok");
        tc.count("x", 1);
        let r = tc.finish("ok");
        assert!(r.events.is_empty());
        assert_eq!(r.summary.dropped_events, 0);
    }

    #[test]
    fn events_recorded_when_enabled() {
        let tc = TraceCollector::new(true);
        tc.event("search", "roots", "ok");
        tc.event("search", "children", "ok");
        let r = tc.finish("ok");
        assert_eq!(r.events.len(), 2);
        assert!(!r.summary.events_truncated);
    }

    #[test]
    fn overflow_drops_and_sets_truncated() {
        let tc = TraceCollector::with_max_events(true, 3);
        for i in 0..10 {
            tc.event("stage", format!("ev{i}"), "ok");
        }
        let r = tc.finish("ok");
        assert_eq!(r.events.len(), 3);
        assert_eq!(r.summary.dropped_events, 7);
        assert!(r.summary.events_truncated);
    }

    #[test]
    fn counters_accumulate() {
        let tc = TraceCollector::new(true);
        tc.count("vector.search_calls", 1);
        tc.count("vector.search_calls", 1);
        let r = tc.finish("ok");
        assert_eq!(r.summary.vector.search_calls, 2);
    }

    #[test]
    fn token_usage_accumulates() {
        let tc = TraceCollector::new(true);
        tc.add_token_usage(10, 20);
        tc.add_token_usage(5, 5);
        let r = tc.finish("ok");
        assert_eq!(r.summary.token_usage.input, 15);
        assert_eq!(r.summary.token_usage.output, 25);
    }

    #[test]
    fn set_error_populates_summary() {
        let tc = TraceCollector::new(true);
        tc.set_error("search", ErrorCode::NotFound, "missing context");
        let r = tc.finish("error");
        let err = r.summary.errors.unwrap();
        assert_eq!(err.code, "NotFound");
        assert_eq!(err.stage, "search");
    }

    #[test]
    fn gauges_set() {
        let tc = TraceCollector::new(true);
        tc.set("gauge.depth", serde_json::json!(3));
        let r = tc.finish("ok");
        assert_eq!(r.summary.gauges["gauge.depth"], 3);
    }
}
