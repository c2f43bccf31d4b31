//! Assistant text completion boundary
//!
//! The dashboard's assistant sends a prompt to a remote completion
//! service and shows whatever comes back. The service itself is opaque;
//! this module only fixes what the user sees when it misbehaves.

use std::future::Future;
use thiserror::Error;
use tracing::error;

/// Persona given to the completion service with every prompt
pub const SYSTEM_INSTRUCTION: &str =
    "You are a helpful coding assistant for a Ukrainian developer platform. \
     Be concise, technical, and friendly.";

/// Shown when the service answers with nothing
pub const EMPTY_RESPONSE: &str = "No response generated.";

/// Shown when the service call fails
pub const SERVICE_ERROR: &str = "Error communicating with AI service.";

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Service rejected request: {0}")]
    Rejected(String),
}

/// Remote `(system instruction, prompt) -> response` call
pub trait CompletionService {
    fn complete(
        &self,
        system: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String, CompletionError>> + Send;
}

/// Ask the service and turn any outcome into display text
///
/// The prompt goes out trimmed, with [`SYSTEM_INSTRUCTION`] as the
/// system instruction. Returns `None` for a blank prompt without calling
/// the service.
pub async fn respond<S: CompletionService>(service: &S, prompt: &str) -> Option<String> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return None;
    }

    match service.complete(SYSTEM_INSTRUCTION, prompt).await {
        Ok(text) if text.trim().is_empty() => Some(EMPTY_RESPONSE.to_string()),
        Ok(text) => Some(text),
        Err(e) => {
            error!("Completion service error: {}", e);
            Some(SERVICE_ERROR.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Scripted {
        reply: Result<&'static str, &'static str>,
        calls: AtomicUsize,
        last_request: Mutex<Option<(String, String)>>,
    }

    impl Scripted {
        fn new(reply: Result<&'static str, &'static str>) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }
    }

    impl CompletionService for Scripted {
        async fn complete(&self, system: &str, prompt: &str) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some((system.to_string(), prompt.to_string()));
            self.reply
                .map(str::to_string)
                .map_err(|e| CompletionError::Transport(e.to_string()))
        }
    }

    #[tokio::test]
    async fn test_passes_answer_through() {
        let service = Scripted::new(Ok("Use cargo fmt."));
        assert_eq!(
            respond(&service, "How do I format?").await.as_deref(),
            Some("Use cargo fmt.")
        );
    }

    #[tokio::test]
    async fn test_empty_answer_gets_placeholder() {
        let service = Scripted::new(Ok("  "));
        assert_eq!(respond(&service, "hi").await.as_deref(), Some(EMPTY_RESPONSE));
    }

    #[tokio::test]
    async fn test_failure_gets_error_text() {
        let service = Scripted::new(Err("connection reset"));
        assert_eq!(respond(&service, "hi").await.as_deref(), Some(SERVICE_ERROR));
    }

    #[tokio::test]
    async fn test_blank_prompt_skips_service() {
        let service = Scripted::new(Ok("unused"));
        assert!(respond(&service, "   ").await.is_none());
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_persona_goes_out_with_prompt() {
        let service = Scripted::new(Ok("Sure."));
        respond(&service, "  explain lifetimes ").await;

        let request = service.last_request.lock().unwrap().clone();
        assert_eq!(
            request,
            Some((SYSTEM_INSTRUCTION.to_string(), "explain lifetimes".to_string()))
        );
    }
}
