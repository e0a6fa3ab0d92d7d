use std::net::IpAddr;
use std::time::Instant;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use pdfqa_core::Answer;
use pdfqa_memory::DocumentId;
use serde::{Deserialize, Serialize};

use super::rate_limit::RateDecision;
use super::router::{ClientIp, RATE_LIMITED};
use super::server::AppState;

const DOCUMENT_NOT_FOUND: &str = "Document not found.";
const MISSING_QUESTION: &str = "Question is required.";

#[derive(Debug, Deserialize)]
struct QaRequest {
    #[serde(default)]
    pdf_id: Option<String>,
    #[serde(default)]
    question: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum QaReply {
    Answer(String),
    Error(String),
}

/// What the session does after replying to one message.
enum Next {
    Continue,
    Close,
}

pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
) -> Response {
    ws.on_upgrade(move |socket| qa_session(socket, state, ip))
}

async fn qa_session(mut socket: WebSocket, state: AppState, ip: IpAddr) {
    tracing::debug!(%ip, "QA channel opened");

    while let Some(msg) = socket.recv().await {
        let payload = match msg {
            Ok(Message::Text(text)) => text.as_str().as_bytes().to_vec(),
            Ok(Message::Binary(bytes)) => bytes.to_vec(),
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::debug!(%ip, "QA channel transport error: {e}");
                break;
            }
        };

        let (reply, next) = handle_message(&state, ip, &payload).await;
        if send_reply(&mut socket, &reply).await.is_err() {
            break;
        }
        if matches!(next, Next::Close) {
            if let Err(e) = socket.send(Message::Close(None)).await {
                tracing::debug!(%ip, "failed to send close frame: {e}");
            }
            break;
        }
    }

    tracing::debug!(%ip, "QA channel closed");
}

async fn handle_message(state: &AppState, ip: IpAddr, payload: &[u8]) -> (QaReply, Next) {
    let request: QaRequest = match serde_json::from_slice(payload) {
        Ok(req) => req,
        Err(e) => return (QaReply::Error(e.to_string()), Next::Close),
    };

    if state.limiter.check(ip, Instant::now()).await == RateDecision::Limited {
        tracing::info!(%ip, "QA message rate limited");
        return (QaReply::Error(RATE_LIMITED.into()), Next::Continue);
    }

    let Some(pdf_id) = request.pdf_id.map(DocumentId) else {
        return (QaReply::Error(DOCUMENT_NOT_FOUND.into()), Next::Continue);
    };

    let Some(question) = request.question else {
        // An unknown document still takes precedence over the missing question.
        return match state.store.document_text(&pdf_id).await {
            Ok(None) => (QaReply::Error(DOCUMENT_NOT_FOUND.into()), Next::Continue),
            Ok(Some(_)) => (QaReply::Error(MISSING_QUESTION.into()), Next::Close),
            Err(e) => (QaReply::Error(e.to_string()), Next::Close),
        };
    };

    match state.qa.answer(&pdf_id, &question).await {
        Ok(Answer::Found(answer)) => (QaReply::Answer(answer), Next::Continue),
        Ok(Answer::NotFound) => (QaReply::Error(DOCUMENT_NOT_FOUND.into()), Next::Continue),
        Err(e) => {
            tracing::warn!(%ip, %pdf_id, "QA request failed: {e}");
            (QaReply::Error(e.to_string()), Next::Close)
        }
    }
}

async fn send_reply(socket: &mut WebSocket, reply: &QaReply) -> Result<(), axum::Error> {
    let json = serde_json::to_string(reply).unwrap_or_else(|_| r#"{"error":"internal error"}"#.into());
    socket.send(Message::Text(json.into())).await
}
