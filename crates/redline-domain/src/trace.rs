//! Tracing collaborator interface
//!
//! A trace covers one `compare` call; spans and generations nest under it,
//! one per stage or upstream call. Backends implement [`Tracer`],
//! [`TraceScope`] and [`Span`]. The pipeline only ever holds the RAII guards
//! defined here, which close their record exactly once: explicitly with an
//! outcome, or as [`SpanOutcome::Abandoned`] when dropped (early return,
//! panic, or a cancelled future).

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Kind of record opened under a trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// Unit of pipeline work
    Span,
    /// A single call to a generation service
    Generation,
}

impl SpanKind {
    /// Lowercase name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanKind::Span => "span",
            SpanKind::Generation => "generation",
        }
    }
}

/// How a span or trace ended
#[derive(Debug, Clone, PartialEq)]
pub enum SpanOutcome {
    /// Finished, with a recorded output
    Success(Value),
    /// Failed, with the error message
    Error(String),
    /// Never explicitly closed
    Abandoned,
}

impl SpanOutcome {
    /// Record a serializable output, falling back to its absence
    pub fn success<T: Serialize>(output: &T) -> Self {
        SpanOutcome::Success(serde_json::to_value(output).unwrap_or(Value::Null))
    }

    /// Whether this is the success variant
    pub fn is_success(&self) -> bool {
        matches!(self, SpanOutcome::Success(_))
    }
}

/// Tags attached to a trace when it is opened
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceContext {
    /// Identifier of the comparison being traced
    pub contract_id: String,
    /// Caller-supplied metadata
    pub metadata: Map<String, Value>,
}

impl TraceContext {
    /// Context for one contract
    pub fn new(contract_id: impl Into<String>) -> Self {
        Self {
            contract_id: contract_id.into(),
            metadata: Map::new(),
        }
    }

    /// Attach caller metadata
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Factory for traces
pub trait Tracer: Send + Sync {
    /// Open a top-level trace
    fn open(&self, name: &str, context: &TraceContext) -> Box<dyn TraceScope>;
}

/// One open trace
pub trait TraceScope: Send + Sync {
    /// Correlation id, if the backend assigns one
    fn trace_id(&self) -> Option<String>;

    /// Open a child record
    fn open_span(&self, kind: SpanKind, name: &str, input: Value) -> Box<dyn Span>;

    /// Close and flush the trace
    fn close(&self, outcome: &SpanOutcome);
}

/// One open child record
pub trait Span: Send {
    /// Close the record
    fn close(&mut self, outcome: &SpanOutcome);
}

/// Owns an open trace and closes it exactly once
pub struct TraceGuard {
    scope: Box<dyn TraceScope>,
    closed: bool,
}

impl TraceGuard {
    /// Open a trace on `tracer`
    pub fn open(tracer: &dyn Tracer, name: &str, context: &TraceContext) -> Self {
        Self {
            scope: tracer.open(name, context),
            closed: false,
        }
    }

    /// Correlation id of the underlying trace
    pub fn trace_id(&self) -> Option<String> {
        self.scope.trace_id()
    }

    /// Open a pipeline span
    pub fn span(&self, name: &str, input: Value) -> SpanGuard {
        SpanGuard::new(self.scope.open_span(SpanKind::Span, name, input))
    }

    /// Open a generation record for one upstream call
    pub fn generation(&self, name: &str, input: Value) -> SpanGuard {
        SpanGuard::new(self.scope.open_span(SpanKind::Generation, name, input))
    }

    /// Close with an explicit outcome
    pub fn close(mut self, outcome: SpanOutcome) {
        self.closed = true;
        self.scope.close(&outcome);
    }
}

impl Drop for TraceGuard {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            self.scope.close(&SpanOutcome::Abandoned);
        }
    }
}

impl fmt::Debug for TraceGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceGuard")
            .field("trace_id", &self.trace_id())
            .field("closed", &self.closed)
            .finish()
    }
}

/// Owns an open span and closes it exactly once
pub struct SpanGuard {
    span: Box<dyn Span>,
    closed: bool,
}

impl SpanGuard {
    fn new(span: Box<dyn Span>) -> Self {
        Self { span, closed: false }
    }

    /// Close with an explicit outcome
    pub fn close(mut self, outcome: SpanOutcome) {
        self.closed = true;
        self.span.close(&outcome);
    }

    /// Close from a stage result
    pub fn record<T: Serialize, E: fmt::Display>(self, result: &Result<T, E>) {
        match result {
            Ok(output) => self.close(SpanOutcome::success(output)),
            Err(e) => self.close(SpanOutcome::Error(e.to_string())),
        }
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            self.span.close(&SpanOutcome::Abandoned);
        }
    }
}

impl fmt::Debug for SpanGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanGuard").field("closed", &self.closed).finish()
    }
}

/// Optional child span helper for stages that receive `Option<&TraceGuard>`
pub fn generation(trace: Option<&TraceGuard>, name: &str, input: Value) -> Option<SpanGuard> {
    trace.map(|t| t.generation(name, input))
}
