//! Redline Service
//!
//! The comparison pipeline behind every transport.
//!
//! # Overview
//!
//! [`ComparisonService::compare`] runs the five stages in order under one
//! trace, reports progress and always returns a
//! [`redline_domain::ProcessingResult`]. Transports obtain services from a
//! [`PipelineFactory`], usually a [`SettingsFactory`] built from
//! [`Settings::load`].
//!
//! # Example Usage
//!
//! ```no_run
//! use redline_service::{CompareRequest, PipelineFactory, Settings, SettingsFactory};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load(None)?.offline();
//! let service = SettingsFactory::new(settings)?.build()?;
//!
//! let envelope = service
//!     .compare(CompareRequest::new("mock://original", "mock://amendment"))
//!     .await;
//! println!("{}", serde_json::to_string_pretty(&envelope)?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod factory;
pub mod progress;
mod service;
pub mod settings;
pub mod trace;

pub use factory::{PipelineFactory, SettingsFactory};
pub use progress::ChannelSink;
pub use service::{CompareRequest, ComparisonService, Stage, TRACE_NAME};
pub use settings::{AgentType, ParserType, Settings, SettingsError, TraceBackend};
pub use trace::{LogTracer, NoopTracer, RecordingTracer, TraceEvent};

use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber (`RUST_LOG`, default `info`)
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
