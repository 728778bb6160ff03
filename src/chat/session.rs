//! One prompt, one streamed reply, then the code-block repaint.

use std::io::Write;

use tracing::info;

use crate::cancel::CancellationToken;
use crate::chat::format::{CodeBlockFormatter, Repaint, TerminalSize};
use crate::chat::highlight::Highlighter;
use crate::chat::stream::StreamRenderer;
use crate::error::ChatError;
use crate::llm::InferenceClient;

pub struct ChatSession<'a> {
    client: &'a dyn InferenceClient,
    system_prompt: &'a str,
    highlighter: &'a dyn Highlighter,
    reformat: bool,
}

impl<'a> ChatSession<'a> {
    pub fn new(
        client: &'a dyn InferenceClient,
        system_prompt: &'a str,
        highlighter: &'a dyn Highlighter,
    ) -> Self {
        Self {
            client,
            system_prompt,
            highlighter,
            reformat: true,
        }
    }

    /// Leave the streamed text as-is, skipping the repaint.
    pub fn plain(mut self) -> Self {
        self.reformat = false;
        self
    }

    /// Send `prompt` and stream the reply to `out`.
    ///
    /// A failed request draws nothing. A stream that fails partway is still
    /// reformatted from what arrived, and the error is returned afterwards.
    pub async fn run<W: Write>(
        &self,
        prompt: &str,
        out: &mut W,
        size: TerminalSize,
        cancel: &CancellationToken,
    ) -> Result<Repaint, ChatError> {
        info!("Sending prompt ({} chars)", prompt.len());
        let stream = cancel
            .run(self.client.stream(self.system_prompt, prompt))
            .await??;

        let outcome = StreamRenderer::new(&mut *out).render(stream, cancel).await?;

        let repaint = if self.reformat && outcome.response.is_complete() {
            CodeBlockFormatter::new(self.highlighter, size).format(out, &outcome.response.text())?
        } else {
            Repaint::Unchanged
        };

        match outcome.error {
            Some(e) => Err(e.into()),
            None => Ok(repaint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InferenceError, RenderError};
    use crate::llm::{MockInferenceClient, TextStream};

    struct Identity;

    impl Highlighter for Identity {
        fn render(&self, line: &str, _language: &str) -> Result<String, RenderError> {
            Ok(line.to_string())
        }
    }

    fn size() -> TerminalSize {
        TerminalSize {
            columns: 40,
            rows: 24,
        }
    }

    fn client_streaming(items: Vec<Result<&'static str, InferenceError>>) -> MockInferenceClient {
        let mut client = MockInferenceClient::new();
        let mut items = Some(items);
        client
            .expect_stream()
            .withf(|system, user| system == "Be brief." && user == "hello")
            .times(1)
            .returning(move |_, _| {
                let items: Vec<Result<String, InferenceError>> = items
                    .take()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|item| item.map(str::to_string))
                    .collect();
                let stream: TextStream = Box::pin(futures::stream::iter(items));
                Ok(stream)
            });
        client
    }

    #[tokio::test]
    async fn test_code_block_repainted_after_stream() {
        let client = client_streaming(vec![Ok("Run:\n```py\n"), Ok("print(1)\n```\n")]);
        let mut out = Vec::new();

        let repaint = ChatSession::new(&client, "Be brief.", &Identity)
            .run("hello", &mut out, size(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            repaint,
            Repaint::Replaced {
                erased_rows: 3,
                panels: 1
            }
        );
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("Run:\n```py\nprint(1)\n```\n"));
        assert!(out.contains("1 │ print(1)"));
    }

    #[tokio::test]
    async fn test_plain_mode_skips_repaint() {
        let client = client_streaming(vec![Ok("```py\nx\n```\n")]);
        let mut out = Vec::new();

        let repaint = ChatSession::new(&client, "Be brief.", &Identity)
            .plain()
            .run("hello", &mut out, size(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(repaint, Repaint::Unchanged);
        assert_eq!(String::from_utf8(out).unwrap(), "```py\nx\n```\n");
    }

    #[tokio::test]
    async fn test_request_failure_draws_nothing() {
        let mut client = MockInferenceClient::new();
        client.expect_stream().returning(|_, _| {
            Err(InferenceError::Status {
                status: 401,
                body: "bad key".to_string(),
            })
        });
        let mut out = Vec::new();

        let result = ChatSession::new(&client, "Be brief.", &Identity)
            .run("hello", &mut out, size(), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(ChatError::Inference(InferenceError::Status { status: 401, .. }))
        ));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_partial_stream_formatted_then_error_reported() {
        let client = client_streaming(vec![
            Ok("```sh\nls\n```\n"),
            Err(InferenceError::InvalidResponse("overloaded".to_string())),
        ]);
        let mut out = Vec::new();

        let result = ChatSession::new(&client, "Be brief.", &Identity)
            .run("hello", &mut out, size(), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(ChatError::Inference(InferenceError::InvalidResponse(_)))
        ));
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("── bash "));
    }
}
