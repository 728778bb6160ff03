//! OpenAI-compatible chat completions over HTTP.

use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::{Stream, StreamExt};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::llm::client::{InferenceClient, TextStream};

/// Characters of an error body kept in [`InferenceError::Status`].
const MAX_ERROR_BODY: usize = 500;

/// Data payload that ends a streamed reply.
const DONE_MARKER: &str = "[DONE]";

pub struct OpenAiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: std::time::Duration,
}

impl OpenAiClient {
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            http: Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            timeout: config.timeout,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Post `body` and check the status.
    ///
    /// A plain request is bounded end to end by the configured timeout. A
    /// streaming request is bounded only until the response headers arrive,
    /// since the reply keeps flowing for as long as the model writes.
    async fn send(&self, body: &ChatRequest<'_>) -> Result<reqwest::Response, InferenceError> {
        debug!(model = %self.model, stream = body.stream, "sending chat request");

        let request = self
            .http
            .post(self.endpoint())
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header(
                ACCEPT,
                if body.stream {
                    "text/event-stream"
                } else {
                    "application/json"
                },
            )
            .json(body);

        let response = if body.stream {
            tokio::time::timeout(self.timeout, request.send())
                .await
                .map_err(|_| InferenceError::Timeout(self.timeout))?
        } else {
            request.timeout(self.timeout).send().await
        }
        .map_err(InferenceError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl InferenceClient for OpenAiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, InferenceError> {
        let body = ChatRequest::new(&self.model, system_prompt, user_prompt, false);
        let response = self.send(&body).await?;

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        let text: String = payload
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .collect();

        if text.trim().is_empty() {
            return Err(InferenceError::EmptyResponse);
        }
        Ok(text)
    }

    async fn stream(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<TextStream, InferenceError> {
        let body = ChatRequest::new(&self.model, system_prompt, user_prompt, true);
        let response = self.send(&body).await?;
        Ok(decode_stream(response.bytes_stream()))
    }
}

/// Turn an SSE byte stream into content fragments, one per data event.
///
/// Stops at `[DONE]`, at the end of the body, or after the first error.
/// Fragments that arrived before an error are yielded before it.
fn decode_stream<S, B>(body: S) -> TextStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let events = Box::pin(body.eventsource());

    let stream = futures::stream::unfold((events, false), |(mut events, finished)| async move {
        if finished {
            return None;
        }
        loop {
            let event = match events.next().await? {
                Ok(event) => event,
                Err(EventStreamError::Transport(e)) => {
                    return Some((Err(InferenceError::Stream(e)), (events, true)));
                }
                Err(e) => {
                    let error = InferenceError::InvalidResponse(e.to_string());
                    return Some((Err(error), (events, true)));
                }
            };

            let data = event.data.trim();
            if data.is_empty() {
                continue;
            }
            if data == DONE_MARKER {
                return None;
            }
            match parse_delta(data) {
                Ok(Some(text)) => return Some((Ok(text), (events, false))),
                Ok(None) => continue,
                Err(e) => return Some((Err(e), (events, true))),
            }
        }
    });

    Box::pin(stream)
}

/// Extract the content fragment from one streamed chunk.
fn parse_delta(payload: &str) -> Result<Option<String>, InferenceError> {
    let chunk: StreamChunk = serde_json::from_str(payload).map_err(|e| {
        warn!("Unparseable stream chunk: {}", payload);
        InferenceError::InvalidResponse(format!("invalid stream chunk: {e}"))
    })?;

    if let Some(error) = chunk.error {
        return Err(InferenceError::InvalidResponse(error.message));
    }

    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .collect();

    Ok(if text.is_empty() { None } else { Some(text) })
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, system_prompt: &'a str, user_prompt: &'a str, stream: bool) -> Self {
        Self {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            stream,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    type Chunk = Result<Vec<u8>, reqwest::Error>;

    fn body(chunks: &[&str]) -> futures::stream::Iter<std::vec::IntoIter<Chunk>> {
        let chunks: Vec<Chunk> = chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
        futures::stream::iter(chunks)
    }

    async fn decode(chunks: &[&str]) -> Vec<Result<String, InferenceError>> {
        decode_stream(body(chunks)).collect().await
    }

    #[tokio::test]
    async fn test_decode_keeps_content_before_error_in_same_chunk() {
        let chunk = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"one\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" two\"}}]}\n\n",
            "data: {\"error\":{\"message\":\"overloaded\"}}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"never\"}}]}\n\n",
        );
        let items = decode(&[chunk]).await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap(), "one");
        assert_eq!(items[1].as_ref().unwrap(), " two");
        assert!(matches!(
            &items[2],
            Err(InferenceError::InvalidResponse(msg)) if msg == "overloaded"
        ));
    }

    #[tokio::test]
    async fn test_decode_event_split_across_chunks() {
        let items = decode(&[
            "data: {\"choices\":[{\"del",
            "ta\":{\"content\":\"héllo\"}}]}\n",
            "\ndata: [DONE]\n\n",
        ])
        .await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "héllo");
    }

    #[tokio::test]
    async fn test_decode_skips_role_only_chunks_and_stops_at_done() {
        let items = decode(&[concat!(
            ": keep-alive\n\n",
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n\n",
        )])
        .await;

        let texts: Vec<&str> = items.iter().map(|r| r.as_ref().unwrap().as_str()).collect();
        assert_eq!(texts, vec!["hi"]);
    }

    #[tokio::test]
    async fn test_decode_body_without_done_ends_at_close() {
        let chunk = "data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}\n\n";
        let items = decode(&[chunk]).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "tail");
    }

    #[test]
    fn test_parse_delta_content() {
        let payload = r#"{"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(parse_delta(payload).unwrap(), Some("Hel".to_string()));
    }

    #[test]
    fn test_parse_delta_role_only_chunk_is_empty() {
        let payload = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_delta(payload).unwrap(), None);
    }

    #[test]
    fn test_parse_delta_finish_chunk_without_delta() {
        let payload = r#"{"choices":[{"finish_reason":"stop"}]}"#;
        assert_eq!(parse_delta(payload).unwrap(), None);
    }

    #[test]
    fn test_parse_delta_error_payload() {
        let payload = r#"{"error":{"message":"rate limited"}}"#;
        assert!(matches!(
            parse_delta(payload),
            Err(InferenceError::InvalidResponse(msg)) if msg == "rate limited"
        ));
    }

    #[test]
    fn test_parse_delta_garbage() {
        assert!(parse_delta("not json").is_err());
    }

    #[test]
    fn test_request_serializes_two_messages() {
        let body = ChatRequest::new("gpt-test", "system text", "user text", true);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-test");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "system text");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "user text");
    }
}
