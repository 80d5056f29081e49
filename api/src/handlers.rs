use crate::credential::validate_credential;
use crate::error::ApiError;
use crate::payloads::*;
use crate::session::{CurrentSession, SESSION_COOKIE};
use crate::state::AppState;
use crate::upload::{index_upload, read_pdf_field};
use axum::{
    extract::{Multipart, State},
    response::Html,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use pdfchat_rag::QaTurn;
use serde_json::{json, Value};

const INDEX_HTML: &str = include_str!("../static/index.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn get_session(Extension(current): Extension<CurrentSession>) -> Json<SessionView> {
    let session = current.handle.lock().await;
    Json(SessionView::from(&*session))
}

/// Ends the session: index, history and credential are dropped.
pub async fn end_session(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    state.sessions.remove(&current.id).await;
    log::info!("Session {} ended", current.id);

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (
        jar,
        Json(MessageResponse {
            message: "Session ended.".to_string(),
        }),
    )
}

/// Stores the bearer credential in the session. It is never written
/// anywhere else.
pub async fn set_credential(
    Extension(current): Extension<CurrentSession>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<SessionView>, ApiError> {
    let TypedHeader(auth) = auth.ok_or_else(ApiError::missing_credential)?;
    let api_key = validate_credential(auth.token())?;

    log::info!("Credential set for session {}: {}", current.id, api_key.masked());

    let mut session = current.handle.lock().await;
    session.set_credential(api_key);
    Ok(Json(SessionView::from(&*session)))
}

pub async fn clear_credential(Extension(current): Extension<CurrentSession>) -> Json<SessionView> {
    let mut session = current.handle.lock().await;
    session.clear_credential();
    Json(SessionView::from(&*session))
}

pub async fn upload_document(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    if let Err(err) = current.handle.lock().await.require_credential() {
        log::warn!("Upload rejected for session {}: no credential", current.id);
        return Err(err);
    }

    let upload = read_pdf_field(&mut multipart).await?;
    let credential = current.handle.lock().await.begin_upload()?;

    log::info!(
        "Session {} uploading {} ({} bytes)",
        current.id,
        upload.filename,
        upload.bytes.len()
    );

    let embedder = state.providers.embedder(&credential);
    let chat_model = state.providers.chat_model(&credential);

    // Indexing runs detached so the session always leaves `Processing`,
    // even if the client goes away mid-upload.
    let handle = current.handle.clone();
    let session_id = current.id;
    let indexed_with = credential.clone();
    let task = tokio::spawn(async move {
        let outcome = index_upload(upload, embedder, chat_model).await;
        let mut session = handle.lock().await;
        match outcome {
            Ok((chain, summary)) => {
                if session.finish_upload(&indexed_with, Some((chain, summary.clone()))) {
                    Ok(summary)
                } else {
                    log::warn!("Session {} changed key during upload; index discarded", session_id);
                    Err(ApiError::credential_changed())
                }
            }
            Err(err) => {
                session.finish_upload(&indexed_with, None);
                log::warn!("Upload failed for session {}: {}", session_id, err.message);
                Err(err)
            }
        }
    });

    let summary = match task.await {
        Ok(result) => result?,
        Err(err) => {
            current.handle.lock().await.finish_upload(&credential, None);
            return Err(ApiError::internal(format!("Upload task failed: {}", err)));
        }
    };

    Ok(Json(UploadResponse {
        message: "PDF processed and ready for queries!".to_string(),
        document: summary,
    }))
}

pub async fn ask_question(
    Extension(current): Extension<CurrentSession>,
    Json(payload): Json<AskPayload>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(ApiError::bad_request("Question must not be empty"));
    }

    let snapshot = current.handle.lock().await.begin_question();
    let (chain, history) = match snapshot {
        Ok(snapshot) => snapshot,
        Err(err) => {
            log::warn!("Question rejected for session {}: {}", current.id, err.error);
            return Err(err);
        }
    };

    let response = chain.ask(question, &history).await.map_err(|e| {
        log::warn!("Question failed for session {}: {}", current.id, e);
        ApiError::from(e)
    })?;

    current
        .handle
        .lock()
        .await
        .record_turn(QaTurn::new(question, response.answer.clone()));

    Ok(Json(AskResponse::from(response)))
}

pub async fn clear_history(Extension(current): Extension<CurrentSession>) -> Json<MessageResponse> {
    current.handle.lock().await.clear_history();
    Json(MessageResponse {
        message: "Chat history cleared!".to_string(),
    })
}
