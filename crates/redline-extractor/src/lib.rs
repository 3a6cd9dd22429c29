//! Redline Extractor
//!
//! Stage implementations for the contract comparison pipeline.
//!
//! # Overview
//!
//! ```text
//! image ──VisionParser──▶ DocumentStructure ─┐
//! image ──VisionParser──▶ DocumentStructure ─┴─LlmContextualizationAgent──▶
//!     ContextualizationResult ──LlmExtractionAgent──▶ ContractChangeResult
//! ```
//!
//! Every stage implements a trait from `redline-domain`, so the comparison
//! service can swap in `MockParser` and the stub agents for offline runs.
//!
//! # Example Usage
//!
//! ```no_run
//! use redline_domain::{DocumentType, ImageParser};
//! use redline_extractor::{ExtractorConfig, VisionParser};
//! use redline_llm::OpenAiProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(OpenAiProvider::new("sk-...", "gpt-5.2")?);
//! let parser = VisionParser::new(provider, ExtractorConfig::default());
//!
//! let doc = parser.parse("scans/original.png", DocumentType::Original, None).await?;
//! println!("{}: {} sections", doc.title, doc.sections.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod call;
mod config;
mod contextualizer;
mod extractor;
pub mod image;
mod json;
mod mock;
mod parser;
mod prompt;


pub use config::ExtractorConfig;
pub use contextualizer::{context_from_response, LlmContextualizationAgent};
pub use extractor::{change_from_response, LlmExtractionAgent};
pub use image::{ImageLoader, LoadedImage};
pub use json::extract_json;
pub use mock::{StubContextualizationAgent, StubExtractionAgent, STUB_SUMMARY};
pub use parser::{structure_from_response, MockParser, VisionParser};
