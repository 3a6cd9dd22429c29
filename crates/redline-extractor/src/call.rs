//! One traced, time-boxed model call

use redline_domain::{SpanGuard, StageError};
use redline_llm::{ChatProvider, ChatRequest, ChatResponse};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Characters of raw model output kept in generation records
const TRACE_OUTPUT_CHARS: usize = 500;

fn preview(text: &str) -> String {
    text.chars().take(TRACE_OUTPUT_CHARS).collect()
}

/// Run `request`, closing `span` with the outcome
///
/// Provider errors are classified against `stage`; hitting `limit` is a
/// timeout. The span records a bounded preview of the output and the token
/// usage.
pub(crate) async fn complete(
    provider: &dyn ChatProvider,
    request: ChatRequest,
    limit: Duration,
    stage: &str,
    span: Option<SpanGuard>,
) -> Result<ChatResponse, StageError> {
    let result = match timeout(limit, provider.complete(request)).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(e.into_stage_error(stage)),
        Err(_) => Err(StageError::Timeout {
            stage: stage.to_string(),
            message: format!("no response within {}s", limit.as_secs()),
        }),
    };

    match &result {
        Ok(response) => {
            debug!(stage, chars = response.content.len(), "Model call complete");
            if let Some(span) = span {
                span.record::<_, String>(&Ok(json!({
                    "output": preview(&response.content),
                    "usage": response.usage,
                })));
            }
        }
        Err(e) => {
            warn!(stage, error = %e, "Model call failed");
            if let Some(span) = span {
                span.record::<(), _>(&Err(e));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use redline_domain::ErrorKind;
    use redline_llm::{LlmError, MockProvider};

    struct SlowProvider;

    #[async_trait]
    impl ChatProvider for SlowProvider {
        async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, LlmError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ChatResponse { content: String::new(), usage: None })
        }

        fn model(&self) -> &str {
            "slow"
        }
    }

    #[test]
    fn test_preview_is_bounded() {
        assert_eq!(preview(&"x".repeat(2000)).len(), 500);
    }

    #[tokio::test]
    async fn test_provider_error_is_classified() {
        let mut provider = MockProvider::default();
        provider.add_error("prompt", LlmError::Connection("refused".into()));

        let request = ChatRequest::user("prompt");
        let err = complete(&provider, request, Duration::from_secs(5), "extraction", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Connection { .. }));
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_is_timeout() {
        let request = ChatRequest::user("x");
        let err = complete(&SlowProvider, request, Duration::from_secs(1), "parse_original", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Timeout { ref stage, .. } if stage == "parse_original"));
    }
}
