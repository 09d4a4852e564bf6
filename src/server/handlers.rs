//! Route handlers
//!
//! Retrieval and generation block, so every query runs on the blocking pool.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::assistant::Answer;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Questions replayed by the self-test route
pub const SELF_TEST_QUESTIONS: [&str; 3] = [
    "Comment récupérer ma fiche de paie ?",
    "Quand est-ce que je suis payé ?",
    "Comment poser des congés ?",
];

/// Self-test responses are cut to this many characters
pub const SELF_TEST_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    question: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    success: bool,
    response: String,
    question: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: &'static str,
    data_count: usize,
    skipped_entries: usize,
    truncated_inputs: u64,
}

#[derive(Debug, Serialize)]
pub struct SelfTestResult {
    question: String,
    response: String,
}

#[derive(Debug, Serialize)]
pub struct SelfTestResponse {
    test_results: Vec<SelfTestResult>,
    chatbot_status: &'static str,
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": message.into() })),
    )
        .into_response()
}

#[inline]
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[inline]
pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let question = match payload {
        Ok(Json(AskRequest {
            question: Some(question),
        })) => question,
        Ok(_) => return failure(StatusCode::BAD_REQUEST, "Question manquante dans la requête"),
        Err(rejection) => {
            debug!("Rejected ask body: {}", rejection);
            return failure(StatusCode::BAD_REQUEST, "Question manquante dans la requête");
        }
    };

    let question = question.trim().to_string();
    if question.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "La question ne peut pas être vide");
    }

    let assistant = Arc::clone(&state.assistant);
    let top_k = assistant.default_top_k();
    let asked = question.clone();
    let answer = tokio::task::spawn_blocking(move || assistant.query(&asked, top_k)).await;

    match answer {
        Ok(Ok(answer)) => {
            if let Answer::Failed { error, .. } = &answer {
                warn!("Answer generation failed for question: {}", error);
            }
            Json(AskResponse {
                success: true,
                response: answer.into_text(),
                question,
            })
            .into_response()
        }
        Ok(Err(e)) => {
            error!("Query failed: {}", e);
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Erreur interne: {e}"),
            )
        }
        Err(e) => {
            error!("Query task failed: {}", e);
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Erreur interne: {e}"),
            )
        }
    }
}

#[inline]
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.assistant.status();
    Json(StatusResponse {
        status: "active",
        data_count: status.entries,
        skipped_entries: status.skipped_entries,
        truncated_inputs: status.truncated_inputs,
    })
}

#[inline]
pub async fn self_test(State(state): State<AppState>) -> Response {
    let assistant = Arc::clone(&state.assistant);
    let results = tokio::task::spawn_blocking(move || {
        let top_k = assistant.default_top_k();
        SELF_TEST_QUESTIONS
            .iter()
            .map(|question| {
                let response = match assistant.query(question, top_k) {
                    Ok(answer) => answer.into_text(),
                    Err(e) => format!("Erreur interne: {e}"),
                };
                SelfTestResult {
                    question: (*question).to_string(),
                    response: preview(&response),
                }
            })
            .collect::<Vec<_>>()
    })
    .await;

    match results {
        Ok(test_results) => {
            info!("Self-test ran {} questions", test_results.len());
            Json(SelfTestResponse {
                test_results,
                chatbot_status: "active",
            })
            .into_response()
        }
        Err(e) => {
            error!("Self-test task failed: {}", e);
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Erreur interne: {e}"),
            )
        }
    }
}

#[inline]
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Endpoint non trouvé" })),
    )
        .into_response()
}

/// First [`SELF_TEST_PREVIEW_CHARS`] characters, with "..." when cut
#[inline]
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SELF_TEST_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
