//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::sync::Arc;

use atelier::auth::{IdentityClaims, create_identity_token};
use atelier::{AppState, config};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const ADMIN_EMAIL: &str = "curator@example.com";
pub const VISITOR_EMAIL: &str = "visitor@example.com";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

pub fn test_config() -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
            domain: "localhost".to_string(),
            protocol: "http".to_string(),
        },
        database: config::DatabaseConfig {
            backend: config::DatabaseBackend::Memory,
            path: "unused.db".into(),
        },
        auth: config::AuthConfig {
            session_secret: "test-secret-key-32-bytes-long!!!".to_string(),
            identity_secret: "test-identity-key-32-bytes-long!".to_string(),
            session_max_age: 604800,
            admin_emails: vec![ADMIN_EMAIL.to_string()],
        },
        ai: config::AiConfig {
            enabled: false,
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_seconds: 5,
        },
        catalog: config::CatalogConfig {
            page_size: 12,
            admin_page_size: 20,
            related_limit: 3,
            history_retention: 100,
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: config::AppConfig) -> Self {
        config.validate().unwrap();

        let repo = Arc::new(atelier::data::InMemoryRepository::new());
        let state = AppState::with_repository(config, repo).unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = atelier::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: format!("http://{}", addr),
            state,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Identity token as the provider would issue it
    pub fn identity_token(&self, sub: &str, email: &str) -> String {
        let claims = IdentityClaims {
            sub: sub.to_string(),
            email: email.to_string(),
            name: Some(format!("User {sub}")),
            picture: None,
            exp: chrono::Utc::now().timestamp() + 300,
        };
        create_identity_token(&claims, &self.state.config.auth.identity_secret).unwrap()
    }

    /// Exchange an identity token for a session token
    pub async fn sign_in(&self, sub: &str, email: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/auth/session"))
            .bearer_auth(self.identity_token(sub, email))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.sign_in("admin-1", ADMIN_EMAIL).await
    }

    pub async fn visitor_token(&self) -> String {
        self.sign_in("visitor-1", VISITOR_EMAIL).await
    }

    /// Create a video through the admin API and return its JSON
    pub async fn create_video(&self, token: &str, title: &str, status: &str, tags: &str) -> Value {
        let response = self
            .client
            .post(self.url("/admin/videos"))
            .bearer_auth(token)
            .json(&video_body(title, status, tags))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        response.json().await.unwrap()
    }
}

pub fn video_body(title: &str, status: &str, tags: &str) -> Value {
    json!({
        "title": title,
        "description": "A short film shot on location.",
        "image": "https://cdn.example.com/thumb.jpg",
        "videoUrl": "https://cdn.example.com/clip.mp4",
        "duration": 225.0,
        "models": ["Ava Stone"],
        "category": "Editorial",
        "tags": tags,
        "status": status,
    })
}
