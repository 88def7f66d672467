use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::ExtractError;
use crate::prompt::ModelRequest;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Anything that can answer a built request. Callers only depend on this
/// contract, so models are swapped by configuration.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    async fn invoke(&self, request: &ModelRequest) -> Result<ModelReply, ExtractError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub content: String,
    pub elapsed: Duration,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

/// Sampling options forwarded verbatim as Ollama `options`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub num_ctx: u32,
    pub num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.7,
            num_ctx: 16384,
            num_predict: 16384,
            seed: Some(10),
        }
    }
}

#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    options: GenerationOptions,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a Value>,
    options: &'a GenerationOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        options: GenerationOptions,
        timeout: Duration,
    ) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractError::Client(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            options,
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Model tags installed on the server, for a setup-time sanity check.
    pub async fn available_models(&self) -> Result<Vec<String>, ExtractError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let body = self.read_body(response).await?;
        let tags: TagsResponse = serde_json::from_str(&body)
            .map_err(|e| ExtractError::MalformedReply(format!("tag list: {e}")))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<String, ExtractError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ExtractError::ServerError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn transport_error(&self, error: reqwest::Error) -> ExtractError {
        if error.is_timeout() {
            ExtractError::InvocationTimeout(self.timeout)
        } else if error.is_connect() {
            ExtractError::EndpointUnreachable(self.base_url.clone())
        } else {
            ExtractError::Client(error.to_string())
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, request: &ModelRequest) -> Result<ModelReply, ExtractError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.prompt },
            ],
            stream: false,
            format: request.format.as_ref(),
            options: &self.options,
        };

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let text = self.read_body(response).await?;
        let elapsed = started.elapsed();

        let chat: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ExtractError::MalformedReply(format!("chat envelope: {e}")))?;

        debug!(
            model = %self.model,
            task = %request.task,
            elapsed_ms = elapsed.as_millis() as u64,
            prompt_tokens = ?chat.prompt_eval_count,
            completion_tokens = ?chat.eval_count,
            "Model answered"
        );

        Ok(ModelReply {
            content: chat.message.content,
            elapsed,
            prompt_tokens: chat.prompt_eval_count,
            completion_tokens: chat.eval_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn request() -> ModelRequest {
        ModelRequest {
            task: "triage".to_string(),
            system: "system".to_string(),
            prompt: "prompt".to_string(),
            format: None,
        }
    }

    /// Serve exactly one HTTP response on a random local port.
    async fn serve_once(status: &'static str, body: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64 * 1024];
            let _ = socket.read(&mut buf).await;
            tokio::time::sleep(delay).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}")
    }

    fn client(base_url: String, timeout: Duration) -> OllamaClient {
        OllamaClient::new(base_url, "gpt-oss:20b", GenerationOptions::default(), timeout).unwrap()
    }

    #[tokio::test]
    async fn test_invoke_reads_chat_envelope() {
        let url = serve_once(
            "200 OK",
            r#"{"model":"gpt-oss:20b","message":{"role":"assistant","content":"{\"a\":1}"},"done":true,"prompt_eval_count":12,"eval_count":5}"#,
            Duration::ZERO,
        )
        .await;

        let reply = client(url, Duration::from_secs(5)).invoke(&request()).await.unwrap();

        assert_eq!(reply.content, r#"{"a":1}"#);
        assert_eq!(reply.prompt_tokens, Some(12));
        assert_eq!(reply.completion_tokens, Some(5));
    }

    #[tokio::test]
    async fn test_non_success_status_is_server_error() {
        let url = serve_once("404 Not Found", r#"{"error":"model not found"}"#, Duration::ZERO).await;

        let err = client(url, Duration::from_secs(5)).invoke(&request()).await.unwrap_err();

        assert!(matches!(err, ExtractError::ServerError { status: 404, ref body } if body.contains("model not found")));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_bad_envelope_is_malformed_reply() {
        let url = serve_once("200 OK", r#"{"unexpected":true}"#, Duration::ZERO).await;

        let err = client(url, Duration::from_secs(5)).invoke(&request()).await.unwrap_err();

        assert!(matches!(err, ExtractError::MalformedReply(_)));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_slow_server_is_invocation_timeout() {
        let url = serve_once("200 OK", "{}", Duration::from_secs(3)).await;

        let err = client(url, Duration::from_millis(200)).invoke(&request()).await.unwrap_err();

        assert!(matches!(err, ExtractError::InvocationTimeout(d) if d == Duration::from_millis(200)));
        assert_eq!(err.to_string(), "Model did not answer within 200ms");
    }

    #[tokio::test]
    async fn test_refused_connection_is_endpoint_unreachable() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{addr}"), Duration::from_secs(5))
            .invoke(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractError::EndpointUnreachable(ref url) if url.contains("127.0.0.1")));
    }

    #[test]
    fn test_request_body_shape() {
        let options = GenerationOptions::default();
        let format = serde_json::json!({"type": "object"});
        let body = ChatRequest {
            model: "phi4",
            messages: [
                ChatMessage { role: "system", content: "s" },
                ChatMessage { role: "user", content: "u" },
            ],
            stream: false,
            format: Some(&format),
            options: &options,
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["stream"], serde_json::json!(false));
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["format"]["type"], "object");
        assert_eq!(value["options"]["num_ctx"], 16384);
        assert_eq!(value["options"]["seed"], 10);
    }
}
