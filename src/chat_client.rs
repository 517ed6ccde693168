// CivicTV - Chat Client
// Front end to the remote RAG meeting-assistant service
//
// The /generate endpoint does not fix its reply field name, so decoding is
// a variant-over-possible-keys decoder with a logged raw-payload fallback.
// This path intentionally has no retry: it is the latency-sensitive
// interactive surface, and errors degrade to an apology message instead.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;

pub const GREETING: &str = "Hello! I'm your meeting assistant. Ask me anything about past meetings, agenda items, or decisions made.";

const CONNECTION_TROUBLE: &str =
    "Sorry, I'm having trouble connecting right now. Please try again later.";

/// Reply field names the service has been observed to use, in the order
/// they are tried.
const REPLY_KEYS: [&str; 5] = ["response", "message", "result", "answer", "text"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    session_id: &'a str,
    user_query: &'a str,
}

/// Client for the RAG chat service, holding the session transcript.
pub struct ChatClient {
    base_url: String,
    client: reqwest::Client,
    session_id: String,
    transcript: Mutex<Vec<ChatMessage>>,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        let client = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap(),
            session_id: Uuid::new_v4().to_string(),
            transcript: Mutex::new(Vec::new()),
        };
        client.push(ChatRole::Assistant, GREETING);
        client
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.lock().clone()
    }

    /// Send one user query and record both sides in the transcript.
    ///
    /// Never fails: a request or decode error is logged and answered with
    /// the connection-trouble apology instead. Returns the assistant
    /// message that was appended.
    pub async fn send(&self, user_text: &str) -> ChatMessage {
        self.push(ChatRole::User, user_text);

        let reply = match self.generate(user_text).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("Chat request failed: {}", e);
                CONNECTION_TROUBLE.to_string()
            }
        };

        self.push(ChatRole::Assistant, &reply)
    }

    /// Raw call to `POST /generate`. Surfaces HTTP and decode failures;
    /// reply-shape sniffing happens in [`reply_text`].
    pub async fn generate(&self, user_query: &str) -> Result<String, ApiError> {
        let url = format!("{}/generate", self.base_url);
        let body = GenerateRequest {
            session_id: &self.session_id,
            user_query,
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status().as_u16()));
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        Ok(reply_text(&payload))
    }

    fn push(&self, role: ChatRole, text: &str) -> ChatMessage {
        let message = ChatMessage {
            role,
            text: text.to_string(),
            timestamp: Utc::now(),
        };
        self.transcript.lock().push(message.clone());
        message
    }
}

/// Extract the assistant reply from a /generate payload.
///
/// Accepts a bare JSON string, then tries the known reply keys in order;
/// anything else is logged and echoed raw so the unexpected shape stays
/// visible instead of being silently guessed at.
pub fn reply_text(payload: &Value) -> String {
    if let Value::String(text) = payload {
        return text.clone();
    }

    for key in REPLY_KEYS {
        if let Some(text) = payload.get(key).and_then(Value::as_str) {
            return text.to_string();
        }
    }

    log::warn!("Unexpected /generate response shape: {}", payload);
    format!(
        "I received your message but got an unexpected response format. Raw response: {}",
        payload
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serve a single canned HTTP response, then stop.
    async fn serve_once(status: u16, body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let reason = if status == 200 { "OK" } else { "Internal Server Error" };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{}", addr)
    }

    #[test]
    fn test_reply_text_tries_known_keys_in_order() {
        assert_eq!(reply_text(&json!({"response": "a"})), "a");
        assert_eq!(reply_text(&json!({"message": "b"})), "b");
        assert_eq!(reply_text(&json!({"result": "c"})), "c");
        assert_eq!(reply_text(&json!({"answer": "d"})), "d");
        assert_eq!(reply_text(&json!({"text": "e"})), "e");
        // First present key wins.
        assert_eq!(reply_text(&json!({"answer": "d", "response": "a"})), "a");
    }

    #[test]
    fn test_reply_text_accepts_bare_string() {
        assert_eq!(reply_text(&json!("plain reply")), "plain reply");
    }

    #[test]
    fn test_reply_text_echoes_unexpected_shape() {
        let echoed = reply_text(&json!({"completion": "hidden"}));
        assert!(echoed.contains("unexpected response format"));
        assert!(echoed.contains("completion"));
    }

    #[tokio::test]
    async fn test_send_records_transcript() {
        let base = serve_once(200, r#"{"answer": "The motion passed 7-4."}"#).await;
        let client = ChatClient::new(&base);

        let reply = client.send("How did the housing vote go?").await;
        assert_eq!(reply.text, "The motion passed 7-4.");
        assert_eq!(reply.role, ChatRole::Assistant);

        let transcript = client.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].text, GREETING);
        assert_eq!(transcript[1].role, ChatRole::User);
        assert_eq!(transcript[2].text, "The motion passed 7-4.");
    }

    #[tokio::test]
    async fn test_send_degrades_to_apology_on_http_error() {
        let base = serve_once(500, "{}").await;
        let client = ChatClient::new(&base);

        let reply = client.send("hello?").await;
        assert!(reply.text.starts_with("Sorry, I'm having trouble connecting"));
    }

    #[tokio::test]
    async fn test_generate_surfaces_status_error() {
        let base = serve_once(503, "{}").await;
        let client = ChatClient::new(&base);

        let err = client.generate("anyone there?").await.unwrap_err();
        assert_eq!(err, crate::error::ApiError::Status(503));
    }

    #[test]
    fn test_session_id_is_unique_per_client() {
        // No server needed; construction mints the id.
        let a = ChatClient::new("http://localhost:8000");
        let b = ChatClient::new("http://localhost:8000");
        assert_ne!(a.session_id(), b.session_id());
    }
}
