use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client as HttpClient;
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion stream error: {0}")]
    Stream(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Transport(err.to_string())
    }
}

/// A lazy, finite, non-restartable sequence of answer fragments. The consumer
/// drives iteration; at most one fragment is in flight.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, CompletionError>> + Send>>;

/// The remote text-generation capability: one prompt in, one completion out,
/// optionally delivered as a token stream.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
    async fn stream(&self, prompt: &str) -> Result<TokenStream, CompletionError>;
}

/// Builds a `CompletionService` for a resolved endpoint. Sessions construct
/// one client per inbound message because the endpoint may be overridden per
/// request.
pub type CompletionFactory = Arc<dyn Fn(&str) -> Arc<dyn CompletionService> + Send + Sync>;

pub fn ollama_factory(http: HttpClient) -> CompletionFactory {
    Arc::new(move |endpoint: &str| -> Arc<dyn CompletionService> {
        Arc::new(OllamaClient::new(http.clone(), endpoint.to_string()))
    })
}

/// Adapter for an Ollama-compatible `/api/generate` endpoint. Streaming
/// responses are NDJSON: one JSON object per line, `done: true` on the last.
pub struct OllamaClient {
    http: HttpClient,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

impl OllamaClient {
    pub fn new(http: HttpClient, endpoint: String) -> Self {
        Self {
            http,
            endpoint,
            model: "mistral".to_string(),
        }
    }

    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response, CompletionError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream,
        };
        let response = self.http.post(&self.endpoint).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status { status, body });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionService for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let response = self.send(prompt, false).await?;
        let body: serde_json::Value = response.json().await?;
        Ok(body["response"].as_str().unwrap_or_default().to_string())
    }

    async fn stream(&self, prompt: &str) -> Result<TokenStream, CompletionError> {
        let response = self.send(prompt, true).await?;
        let bytes = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut bytes = std::pin::pin!(bytes);
            let mut buffer = String::new();
            loop {
                let chunk = match bytes.next().await {
                    Some(Ok(chunk)) => chunk,
                    Some(Err(err)) => {
                        yield Err(CompletionError::Stream(err.to_string()));
                        return;
                    }
                    None => return,
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(idx) = buffer.find('\n') {
                    let line = buffer[..idx].trim().to_string();
                    buffer = buffer[idx + 1..].to_string();
                    match parse_stream_line(&line) {
                        Ok(Some(fragment)) => {
                            if !fragment.is_empty() {
                                yield Ok(fragment);
                            }
                        }
                        Ok(None) => continue,
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Decode one NDJSON line into a fragment. Returns `Ok(None)` for blank lines
/// and for the terminal `done` record, which carries no text.
fn parse_stream_line(line: &str) -> Result<Option<String>, CompletionError> {
    if line.is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value = serde_json::from_str(line)
        .map_err(|err| CompletionError::Stream(format!("bad NDJSON line: {}", err)))?;

    if let Some(detail) = value["error"].as_str() {
        return Err(CompletionError::Stream(detail.to_string()));
    }
    Ok(value["response"].as_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fragment_line() {
        let fragment = parse_stream_line(r#"{"response": "Hello", "done": false}"#).unwrap();
        assert_eq!(fragment.as_deref(), Some("Hello"));
    }

    #[test]
    fn terminal_line_yields_nothing() {
        let fragment = parse_stream_line(r#"{"done": true}"#).unwrap();
        assert!(fragment.is_none());
        assert!(parse_stream_line("").unwrap().is_none());
    }

    #[test]
    fn error_line_surfaces_as_stream_error() {
        let err = parse_stream_line(r#"{"error": "model not loaded"}"#).unwrap_err();
        assert!(err.to_string().contains("model not loaded"));
    }

    #[test]
    fn malformed_line_is_a_stream_error() {
        assert!(parse_stream_line("not json").is_err());
    }
}
