//! Drives a running server: health check, credential, upload, question.
//!
//! cargo run -p pdfchat_api --example client -- <file.pdf> "<question>"
//! Reads the key from OPENAI_API_KEY and the server from PDFCHAT_URL.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let pdf_path = args.next().ok_or("usage: client <file.pdf> [question]")?;
    let question = args
        .next()
        .unwrap_or_else(|| "What is this document about?".to_string());
    let api_key = env::var("OPENAI_API_KEY")?;
    let base_url = env::var("PDFCHAT_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());

    // The session lives in a cookie, so keep them between requests.
    let client = Client::builder().cookie_store(true).build()?;

    println!("Health check:");
    let health: Value = client
        .get(format!("{}/health", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!("{}", serde_json::to_string_pretty(&health)?);

    println!("\nSetting credential:");
    let session: Value = client
        .post(format!("{}/api/credential", base_url))
        .bearer_auth(&api_key)
        .send()
        .await?
        .json()
        .await?;
    println!("{}", serde_json::to_string_pretty(&session)?);

    println!("\nUploading {}:", pdf_path);
    let bytes = tokio::fs::read(&pdf_path).await?;
    let filename = std::path::Path::new(&pdf_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload.pdf".to_string());
    let form = Form::new().part(
        "file",
        Part::bytes(bytes)
            .file_name(filename)
            .mime_str("application/pdf")?,
    );
    let upload_response = client
        .post(format!("{}/api/upload", base_url))
        .multipart(form)
        .send()
        .await?;
    println!("Status: {}", upload_response.status());
    let upload: Value = upload_response.json().await?;
    println!("{}", serde_json::to_string_pretty(&upload)?);

    println!("\nAsking: {}", question);
    let answer_response = client
        .post(format!("{}/api/ask", base_url))
        .json(&json!({ "question": question }))
        .send()
        .await?;
    println!("Status: {}", answer_response.status());
    let answer: Value = answer_response.json().await?;
    println!("{}", serde_json::to_string_pretty(&answer)?);

    Ok(())
}
