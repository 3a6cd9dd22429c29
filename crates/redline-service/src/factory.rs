//! Building a `ComparisonService` per unit of work
//!
//! Transports ask the factory for a fresh service per request or message, so
//! collaborators are never shared between concurrent jobs.

use crate::service::ComparisonService;
use crate::settings::{AgentType, ParserType, Settings, SettingsError, TraceBackend};
use crate::trace::{LogTracer, NoopTracer};
use redline_domain::{ContextualizationAgent, ExtractionAgent, ImageParser, Tracer};
use redline_extractor::{
    LlmContextualizationAgent, LlmExtractionAgent, MockParser, StubContextualizationAgent,
    StubExtractionAgent, VisionParser,
};
use redline_llm::{ChatProvider, OpenAiProvider};
use std::sync::Arc;

/// Source of pipelines for a transport
pub trait PipelineFactory: Send + Sync {
    /// Build a service for one unit of work
    fn build(&self) -> Result<ComparisonService, SettingsError>;
}

impl<F> PipelineFactory for F
where
    F: Fn() -> Result<ComparisonService, SettingsError> + Send + Sync,
{
    fn build(&self) -> Result<ComparisonService, SettingsError> {
        self()
    }
}

/// Factory driven by [`Settings`]
#[derive(Debug, Clone)]
pub struct SettingsFactory {
    settings: Settings,
}

impl SettingsFactory {
    /// Validate `settings` and wrap them
    pub fn new(settings: Settings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// The settings this factory builds from
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn provider(&self) -> Result<Arc<dyn ChatProvider>, SettingsError> {
        let provider = OpenAiProvider::with_options(
            self.settings.openai_base_url.as_str(),
            self.settings.openai_api_key.as_str(),
            self.settings.model_name.as_str(),
            self.settings.extractor.request_timeout(),
        )
        .map_err(|e| SettingsError::Invalid(e.to_string()))?;
        Ok(Arc::new(provider))
    }

    fn tracer(&self) -> Arc<dyn Tracer> {
        match self.settings.trace_backend {
            TraceBackend::Log => Arc::new(LogTracer),
            TraceBackend::Disabled => Arc::new(NoopTracer),
        }
    }
}

impl PipelineFactory for SettingsFactory {
    fn build(&self) -> Result<ComparisonService, SettingsError> {
        let config = self.settings.extractor.clone();
        let provider = if self.settings.needs_provider() {
            Some(self.provider()?)
        } else {
            None
        };

        let parser: Arc<dyn ImageParser> = match (self.settings.parser_type, &provider) {
            (ParserType::OpenAi, Some(provider)) => {
                Arc::new(VisionParser::new(provider.clone(), config.clone()))
            }
            _ => Arc::new(MockParser::new()),
        };

        let (contextualizer, extractor): (
            Arc<dyn ContextualizationAgent>,
            Arc<dyn ExtractionAgent>,
        ) = match (self.settings.agent_type, &provider) {
            (AgentType::OpenAi, Some(provider)) => (
                Arc::new(LlmContextualizationAgent::new(provider.clone(), config.clone())),
                Arc::new(LlmExtractionAgent::new(provider.clone(), config)),
            ),
            _ => {
                let result = StubExtractionAgent::default_result()
                    .map_err(|e| SettingsError::Invalid(e.to_string()))?;
                (
                    Arc::new(StubContextualizationAgent::default()),
                    Arc::new(StubExtractionAgent::new(result)),
                )
            }
        };

        Ok(
            ComparisonService::new(parser, contextualizer, extractor, self.tracer())
                .with_strict_fallbacks(self.settings.strict_fallbacks),
        )
    }
}
