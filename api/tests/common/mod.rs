#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use pdfchat_api::providers::ProviderFactory;
use pdfchat_api::{app, AppState, ServerConfig};
use pdfchat_rag::{ApiKey, ChatMessage, ChatModel, Embedder, RagError, Role};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const TEST_KEY: &str = "sk-test-0123456789abcdef";
pub const OTHER_KEY: &str = "sk-other-fedcba9876543210";
const BOUNDARY: &str = "pdfchat-test-boundary";
const KEYWORDS: [&str; 6] = ["capital", "france", "paris", "germany", "berlin", "rain"];

#[derive(Default)]
pub struct CallCounts {
    pub factory: AtomicUsize,
    pub embed: AtomicUsize,
    pub chat: AtomicUsize,
    /// Keys the chat model was built with, in order.
    pub chat_keys: Mutex<Vec<String>>,
}

impl CallCounts {
    pub fn chat_keys(&self) -> Vec<String> {
        self.chat_keys.lock().unwrap().clone()
    }

    pub fn total(&self) -> usize {
        self.factory.load(Ordering::SeqCst)
            + self.embed.load(Ordering::SeqCst)
            + self.chat.load(Ordering::SeqCst)
    }
}

struct KeywordEmbedder {
    counts: Arc<CallCounts>,
    fail: bool,
    delay: Option<Duration>,
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> pdfchat_rag::Result<Vec<Vec<f32>>> {
        self.counts.embed.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(RagError::Authentication("Incorrect API key provided".to_string()));
        }
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                KEYWORDS.iter().map(|k| lower.matches(k).count() as f32).collect()
            })
            .collect())
    }
}

struct ContextEchoChat {
    counts: Arc<CallCounts>,
}

#[async_trait]
impl ChatModel for ContextEchoChat {
    async fn complete(&self, messages: &[ChatMessage]) -> pdfchat_rag::Result<String> {
        self.counts.chat.fetch_add(1, Ordering::SeqCst);

        let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        if last.contains("Standalone question:") {
            return Ok(last
                .rsplit("Follow Up Input: ")
                .next()
                .and_then(|rest| rest.split('\n').next())
                .unwrap_or_default()
                .to_string());
        }

        let context = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        if context.contains("Paris") {
            Ok("The capital of France is Paris.".to_string())
        } else {
            Ok("I don't know.".to_string())
        }
    }
}

pub struct MockProviders {
    pub counts: Arc<CallCounts>,
    pub fail_embeddings: bool,
    pub embed_delay: Option<Duration>,
}

impl ProviderFactory for MockProviders {
    fn embedder(&self, _api_key: &ApiKey) -> Arc<dyn Embedder> {
        self.counts.factory.fetch_add(1, Ordering::SeqCst);
        Arc::new(KeywordEmbedder {
            counts: self.counts.clone(),
            fail: self.fail_embeddings,
            delay: self.embed_delay,
        })
    }

    fn chat_model(&self, api_key: &ApiKey) -> Arc<dyn ChatModel> {
        self.counts.factory.fetch_add(1, Ordering::SeqCst);
        self.counts
            .chat_keys
            .lock()
            .unwrap()
            .push(api_key.expose().to_string());
        Arc::new(ContextEchoChat {
            counts: self.counts.clone(),
        })
    }
}

pub fn test_app() -> (Router, Arc<CallCounts>) {
    build_app(false, None)
}

pub fn failing_app() -> (Router, Arc<CallCounts>) {
    build_app(true, None)
}

/// Embedding takes `delay`, long enough to abandon an upload mid-flight.
pub fn slow_app(delay: Duration) -> (Router, Arc<CallCounts>) {
    build_app(false, Some(delay))
}

fn build_app(fail_embeddings: bool, embed_delay: Option<Duration>) -> (Router, Arc<CallCounts>) {
    let counts = Arc::new(CallCounts::default());
    let providers = Arc::new(MockProviders {
        counts: counts.clone(),
        fail_embeddings,
        embed_delay,
    });
    let state = AppState::with_providers(ServerConfig::default(), providers);
    (app(state), counts)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub cookie: Option<String>,
    pub body: Value,
    pub text: String,
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.to_string());

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8_lossy(&bytes).to_string();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        cookie,
        body,
        text,
    }
}

fn with_cookie(builder: axum::http::request::Builder, cookie: Option<&str>) -> axum::http::request::Builder {
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

pub fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::builder().method("GET").uri(path), cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn delete(path: &str, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::builder().method("DELETE").uri(path), cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_empty(path: &str, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::builder().method("POST").uri(path), cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_credential(key: Option<&str>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = with_cookie(Request::builder().method("POST").uri("/api/credential"), cookie);
    if let Some(key) = key {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn ask(question: &str, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::builder().method("POST").uri("/api/ask"), cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "question": question }).to_string()))
        .unwrap()
}

pub fn upload(filename: &str, bytes: &[u8], cookie: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    with_cookie(Request::builder().method("POST").uri("/api/upload"), cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// A fresh session with a credential already accepted; returns its cookie.
pub async fn configured_session(app: &Router) -> String {
    let response = send(app, post_credential(Some(TEST_KEY), None)).await;
    assert_eq!(response.status, StatusCode::OK);
    response.cookie.expect("new session sets a cookie")
}

/// Polls the session until `done` accepts its status; returns the last status seen.
pub async fn wait_for_status(app: &Router, cookie: &str, done: impl Fn(&str) -> bool) -> String {
    let mut status = String::new();
    for _ in 0..100 {
        let response = send(app, get("/api/session", Some(cookie))).await;
        status = response.body["status"].as_str().unwrap_or_default().to_string();
        if done(&status) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    status
}

/// Builds a small PDF with one text line per page, using a standard font.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let page_count = pages.len();
    let font_id = 3;
    let first_page_id = 4;

    let mut objects: Vec<String> = Vec::new();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());

    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", first_page_id + i * 2))
        .collect();
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        page_count
    ));
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );

    for (i, text) in pages.iter().enumerate() {
        let content_id = first_page_id + i * 2 + 1;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R /Resources << /Font << /F1 {} 0 R >> >> >>",
            content_id, font_id
        ));
        let stream = format!("BT /F1 18 Tf 72 700 Td ({}) Tj ET", text);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (i, object) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, object));
    }

    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    pdf.push_str("0000000000 65535 f \n");
    for offset in offsets {
        pdf.push_str(&format!("{:010} 00000 n \n", offset));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));

    pdf.into_bytes()
}
