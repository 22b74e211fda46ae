//! OpenAI-compatible chat completions client

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Prompt, TextGenerator};
use crate::config::AiConfig;
use crate::error::AppError;

/// Calls `POST {endpoint}/chat/completions`
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &AiConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("atelier/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            model: config.model.clone(),
        })
    }

    fn request_body(&self, prompt: &Prompt) -> Value {
        let user_content = match &prompt.image {
            Some(image) => json!([
                { "type": "text", "text": prompt.text },
                { "type": "image_url", "image_url": { "url": image } },
            ]),
            None => json!(prompt.text),
        };

        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": user_content },
            ],
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, prompt: Prompt) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let mut request = self.client.post(&url).json(&self.request_body(&prompt));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Upstream(format!(
                "chat completion returned {status}"
            )));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Upstream("chat completion had no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn client(endpoint: String) -> OpenAiClient {
        OpenAiClient::new(&AiConfig {
            enabled: true,
            endpoint,
            api_key: Some("test-key".to_string()),
            model: "test-model".to_string(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    fn prompt() -> Prompt {
        Prompt {
            system: "system".to_string(),
            text: "hello".to_string(),
            image: Some("data:image/gif;base64,AA==".to_string()),
        }
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "test-model");
                assert_eq!(body["messages"][1]["content"][1]["type"], "image_url");
                Json(json!({
                    "choices": [{ "message": { "role": "assistant", "content": "Hi there" } }]
                }))
            }),
        );
        let endpoint = serve(app).await;

        let answer = client(endpoint).generate(prompt()).await.unwrap();
        assert_eq!(answer, "Hi there");
    }

    #[tokio::test]
    async fn error_status_is_upstream() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let endpoint = serve(app).await;

        let result = client(endpoint).generate(prompt()).await;
        assert!(matches!(result, Err(AppError::Upstream(_))));
    }

    #[test]
    fn text_only_prompt_sends_plain_content() {
        let client = client("http://localhost/v1/".to_string());
        let body = client.request_body(&Prompt {
            image: None,
            ..prompt()
        });
        assert_eq!(body["messages"][1]["content"], "hello");
        assert_eq!(client.endpoint, "http://localhost/v1");
    }
}
