//! Redline Worker
//!
//! Queue front end for the comparison pipeline. Job requests arrive on a
//! durable AMQP queue; when a message names a `reply_to` queue, the result
//! is published there with the inbound correlation id.
//!
//! ```text
//! {job_id, contract_id, original_image, amendment_image, metadata?}
//!     ──▶ ComparisonService::compare ──▶
//! {job_id, contract_id, status, result?, error?, processing_time_ms?, trace_id?}
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod metrics;
pub mod worker;

pub use config::WorkerConfig;
pub use error::WorkerError;
pub use handler::JobHandler;
pub use message::{JobRequest, JobResponse};
pub use metrics::WorkerMetrics;
pub use worker::QueueWorker;
