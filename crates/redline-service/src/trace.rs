//! Tracer backends
//!
//! - [`LogTracer`]: traces and spans as `tracing` events, with elapsed times
//! - [`NoopTracer`]: discards everything, no trace id
//! - [`RecordingTracer`]: keeps every event in memory for assertions

use redline_domain::{Span, SpanKind, SpanOutcome, TraceContext, TraceScope, Tracer};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

fn outcome_label(outcome: &SpanOutcome) -> &'static str {
    match outcome {
        SpanOutcome::Success(_) => "success",
        SpanOutcome::Error(_) => "error",
        SpanOutcome::Abandoned => "abandoned",
    }
}

/// Tracer that writes to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

struct LogScope {
    trace_id: String,
    name: String,
    contract_id: String,
    started: Instant,
}

struct LogSpan {
    trace_id: String,
    kind: SpanKind,
    name: String,
    started: Instant,
}

impl Tracer for LogTracer {
    fn open(&self, name: &str, context: &TraceContext) -> Box<dyn TraceScope> {
        let trace_id = Uuid::now_v7().to_string();
        let metadata = Value::Object(context.metadata.clone());
        info!(
            trace_id = %trace_id,
            contract_id = %context.contract_id,
            metadata = %metadata,
            "Trace {} opened", name
        );
        Box::new(LogScope {
            trace_id,
            name: name.to_string(),
            contract_id: context.contract_id.clone(),
            started: Instant::now(),
        })
    }
}

impl TraceScope for LogScope {
    fn trace_id(&self) -> Option<String> {
        Some(self.trace_id.clone())
    }

    fn open_span(&self, kind: SpanKind, name: &str, input: Value) -> Box<dyn Span> {
        debug!(
            trace_id = %self.trace_id,
            kind = kind.as_str(),
            input = %input,
            "Span {} opened", name
        );
        Box::new(LogSpan {
            trace_id: self.trace_id.clone(),
            kind,
            name: name.to_string(),
            started: Instant::now(),
        })
    }

    fn close(&self, outcome: &SpanOutcome) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        match outcome {
            SpanOutcome::Success(_) => info!(
                trace_id = %self.trace_id,
                contract_id = %self.contract_id,
                elapsed_ms,
                "Trace {} closed", self.name
            ),
            SpanOutcome::Error(message) => warn!(
                trace_id = %self.trace_id,
                contract_id = %self.contract_id,
                elapsed_ms,
                error = %message,
                "Trace {} failed", self.name
            ),
            SpanOutcome::Abandoned => warn!(
                trace_id = %self.trace_id,
                contract_id = %self.contract_id,
                elapsed_ms,
                "Trace {} abandoned", self.name
            ),
        }
    }
}

impl Span for LogSpan {
    fn close(&mut self, outcome: &SpanOutcome) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        match outcome {
            SpanOutcome::Success(output) => debug!(
                trace_id = %self.trace_id,
                kind = self.kind.as_str(),
                elapsed_ms,
                output = %output,
                "Span {} closed", self.name
            ),
            other => debug!(
                trace_id = %self.trace_id,
                kind = self.kind.as_str(),
                elapsed_ms,
                outcome = outcome_label(other),
                "Span {} closed", self.name
            ),
        }
    }
}

/// Tracer that records nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

struct NoopScope;
struct NoopSpan;

impl Tracer for NoopTracer {
    fn open(&self, _name: &str, _context: &TraceContext) -> Box<dyn TraceScope> {
        Box::new(NoopScope)
    }
}

impl TraceScope for NoopScope {
    fn trace_id(&self) -> Option<String> {
        None
    }

    fn open_span(&self, _kind: SpanKind, _name: &str, _input: Value) -> Box<dyn Span> {
        Box::new(NoopSpan)
    }

    fn close(&self, _outcome: &SpanOutcome) {}
}

impl Span for NoopSpan {
    fn close(&mut self, _outcome: &SpanOutcome) {}
}

/// One event seen by a [`RecordingTracer`]
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    /// A trace was opened
    TraceOpened {
        /// Trace name
        name: String,
        /// Contract the trace belongs to
        contract_id: String,
        /// Tags supplied at open
        metadata: Map<String, Value>,
    },
    /// A child record was opened
    SpanOpened {
        /// Span or generation
        kind: SpanKind,
        /// Record name
        name: String,
        /// Recorded input
        input: Value,
    },
    /// A child record was closed
    SpanClosed {
        /// Record name
        name: String,
        /// How it ended
        outcome: SpanOutcome,
    },
    /// The trace was closed
    TraceClosed {
        /// How it ended
        outcome: SpanOutcome,
    },
}

type Events = Arc<Mutex<Vec<TraceEvent>>>;

fn lock(events: &Events) -> MutexGuard<'_, Vec<TraceEvent>> {
    events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory tracer; clones share the same event log
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    events: Events,
}

struct RecordingScope {
    trace_id: String,
    events: Events,
}

struct RecordingSpan {
    name: String,
    events: Events,
}

impl RecordingTracer {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event so far
    pub fn events(&self) -> Vec<TraceEvent> {
        lock(&self.events).clone()
    }

    /// Names of opened spans, in order
    pub fn span_names(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                TraceEvent::SpanOpened { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Outcomes the trace was closed with (exactly one per `compare`)
    pub fn trace_closes(&self) -> Vec<SpanOutcome> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                TraceEvent::TraceClosed { outcome } => Some(outcome.clone()),
                _ => None,
            })
            .collect()
    }

    /// Outcome of the most recent close of span `name`
    pub fn span_outcome(&self, name: &str) -> Option<SpanOutcome> {
        lock(&self.events).iter().rev().find_map(|event| match event {
            TraceEvent::SpanClosed { name: closed, outcome } if closed == name => {
                Some(outcome.clone())
            }
            _ => None,
        })
    }
}

impl Tracer for RecordingTracer {
    fn open(&self, name: &str, context: &TraceContext) -> Box<dyn TraceScope> {
        lock(&self.events).push(TraceEvent::TraceOpened {
            name: name.to_string(),
            contract_id: context.contract_id.clone(),
            metadata: context.metadata.clone(),
        });
        Box::new(RecordingScope {
            trace_id: format!("trace-{}", Uuid::now_v7()),
            events: self.events.clone(),
        })
    }
}

impl TraceScope for RecordingScope {
    fn trace_id(&self) -> Option<String> {
        Some(self.trace_id.clone())
    }

    fn open_span(&self, kind: SpanKind, name: &str, input: Value) -> Box<dyn Span> {
        lock(&self.events).push(TraceEvent::SpanOpened {
            kind,
            name: name.to_string(),
            input,
        });
        Box::new(RecordingSpan {
            name: name.to_string(),
            events: self.events.clone(),
        })
    }

    fn close(&self, outcome: &SpanOutcome) {
        lock(&self.events).push(TraceEvent::TraceClosed {
            outcome: outcome.clone(),
        });
    }
}

impl Span for RecordingSpan {
    fn close(&mut self, outcome: &SpanOutcome) {
        lock(&self.events).push(TraceEvent::SpanClosed {
            name: self.name.clone(),
            outcome: outcome.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_domain::TraceGuard;
    use serde_json::json;

    #[test]
    fn test_recording_tracer_keeps_order() {
        let tracer = RecordingTracer::new();
        let trace = TraceGuard::open(&tracer, "contract_comparison", &TraceContext::new("c-1"));
        assert!(trace.trace_id().unwrap().starts_with("trace-"));

        trace
            .span("parse_original_contract", json!({"path": "a.png"}))
            .close(SpanOutcome::Success(json!({"sections_count": 3})));
        trace.close(SpanOutcome::Success(json!({"status": "success"})));

        assert_eq!(tracer.span_names(), vec!["parse_original_contract"]);
        assert_eq!(
            tracer.span_outcome("parse_original_contract"),
            Some(SpanOutcome::Success(json!({"sections_count": 3})))
        );
        assert_eq!(tracer.trace_closes().len(), 1);
        assert!(matches!(
            tracer.events().first(),
            Some(TraceEvent::TraceOpened { contract_id, .. }) if contract_id == "c-1"
        ));
    }

    #[test]
    fn test_noop_tracer_has_no_id() {
        let trace = TraceGuard::open(&NoopTracer, "contract_comparison", &TraceContext::new("c-1"));
        assert_eq!(trace.trace_id(), None);
        trace.span("agent2_extraction", Value::Null).close(SpanOutcome::Abandoned);
    }

    #[test]
    fn test_log_tracer_assigns_ids() {
        let first = TraceGuard::open(&LogTracer, "contract_comparison", &TraceContext::new("c-1"));
        let second = TraceGuard::open(&LogTracer, "contract_comparison", &TraceContext::new("c-2"));
        assert_ne!(first.trace_id(), second.trace_id());
        first
            .generation("extraction_llm_call", Value::Null)
            .close(SpanOutcome::Error("boom".into()));
    }

    #[test]
    fn test_log_tracer_logs_metadata() {
        let mut metadata = Map::new();
        metadata.insert("original_image".into(), json!("a.png"));
        metadata.insert("tenant".into(), json!("acme"));
        let context = TraceContext::new("c-3").with_metadata(metadata);

        let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
        tracing::subscriber::with_default(subscriber, || {
            let trace = TraceGuard::open(&LogTracer, "contract_comparison", &context);
            assert!(trace.trace_id().is_some());
            trace.close(SpanOutcome::Success(json!({"status": "success"})));
        });
    }
}
