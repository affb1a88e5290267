//! Sizing quiz REST API endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use storefront_quiz::{Advance, Question, SessionSnapshot};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::rest::AppState;

/// Maximum length of a question id / answer key.
const MAX_KEY_LEN: usize = 128;

/// Maximum length of an answer value.
const MAX_VALUE_LEN: usize = 1024;

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub flow: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_id: String,
    pub value: String,
}

#[derive(Serialize)]
pub struct FlowSummary {
    pub id: String,
    pub total_steps: usize,
}

#[derive(Serialize)]
pub struct QuizOverview {
    pub question_order: Vec<String>,
    pub total_steps: usize,
    pub flows: Vec<FlowSummary>,
    pub questions: Vec<Question>,
}

#[derive(Serialize)]
pub struct QuestionResponse {
    pub question: Question,
    /// 1-based position in the canonical order; absent for flow-only questions.
    pub step: Option<usize>,
    pub total_steps: usize,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session: SessionSnapshot,
    /// Screen the visitor should be on.
    pub route: Option<String>,
}

#[derive(Serialize)]
pub struct AdvanceResponse {
    pub finished: bool,
    pub next_question_id: Option<String>,
    pub route: String,
    pub step: Option<usize>,
    pub total_steps: usize,
    pub session: SessionSnapshot,
}

/// Validate an answer at the API boundary. Completeness of composite
/// answers is the screen's responsibility.
fn validate_answer(request: &AnswerRequest) -> Result<(), &'static str> {
    if request.question_id.trim().is_empty() {
        return Err("'question_id' must not be empty");
    }
    if request.question_id.len() > MAX_KEY_LEN {
        return Err("'question_id' exceeds maximum length");
    }
    if request.value.len() > MAX_VALUE_LEN {
        return Err("'value' exceeds maximum length");
    }
    Ok(())
}

fn session_response(state: &AppState, session: SessionSnapshot) -> SessionResponse {
    let route = match (&session.current_question_id, session.completed_at) {
        (Some(id), _) => Some(state.quiz.route_for(id)),
        (None, Some(_)) => Some(state.quiz.results_route.clone()),
        (None, None) => None,
    };
    SessionResponse { session, route }
}

/// GET /v1/quiz/questions — Catalog overview.
pub async fn list_questions(State(state): State<AppState>) -> Json<QuizOverview> {
    let catalog = state.sessions.catalog();
    Json(QuizOverview {
        question_order: catalog.question_order().to_vec(),
        total_steps: catalog.default_flow().len(),
        flows: catalog
            .flows()
            .iter()
            .map(|f| FlowSummary {
                id: f.id.clone(),
                total_steps: f.len(),
            })
            .collect(),
        questions: catalog.questions().to_vec(),
    })
}

/// GET /v1/quiz/questions/:id — Single question; 404 tells the screen to render nothing.
pub async fn get_question(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let catalog = state.sessions.catalog();
    let question = catalog
        .get_question(&question_id)
        .ok_or_else(|| ApiError::NotFound(format!("question '{question_id}' not found")))?;

    Ok(Json(QuestionResponse {
        question: question.clone(),
        step: catalog.step_number(&question_id),
        total_steps: catalog.default_flow().len(),
    }))
}

/// POST /v1/quiz/sessions — Start a quiz session.
pub async fn create_session(
    State(state): State<AppState>,
    request: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let snapshot = state.sessions.create(request.flow.as_deref())?;

    metrics::counter!("quiz.sessions.started", "flow" => snapshot.flow.clone()).increment(1);
    info!(session_id = %snapshot.session_id, flow = %snapshot.flow, "Quiz session created");

    Ok((StatusCode::CREATED, Json(session_response(&state, snapshot))))
}

/// GET /v1/quiz/sessions/:id — Current session state.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let snapshot = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("session '{session_id}' not found")))?;
    Ok(Json(session_response(&state, snapshot)))
}

/// DELETE /v1/quiz/sessions/:id — Discard a session.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> StatusCode {
    if state.sessions.remove(&session_id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// PUT /v1/quiz/sessions/:id/answers — Store an answer without advancing.
pub async fn set_answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    if let Err(msg) = validate_answer(&request) {
        warn!(session_id = %session_id, error = msg, "Answer validation failed");
        metrics::counter!("api.validation_errors").increment(1);
        return Err(ApiError::BadRequest(msg.to_string()));
    }

    let snapshot = state.sessions.with_session(&session_id, |session| {
        session.set_answer(request.question_id, request.value)?;
        Ok(session.snapshot())
    })?;

    metrics::counter!("quiz.answers").increment(1);
    Ok(Json(session_response(&state, snapshot)))
}

/// POST /v1/quiz/sessions/:id/next — Store an answer and move on.
pub async fn go_to_next(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AdvanceResponse>, ApiError> {
    if let Err(msg) = validate_answer(&request) {
        warn!(session_id = %session_id, error = msg, "Answer validation failed");
        metrics::counter!("api.validation_errors").increment(1);
        return Err(ApiError::BadRequest(msg.to_string()));
    }

    let (advance, snapshot) = state.sessions.with_session(&session_id, |session| {
        let advance = session.go_to_next(request.question_id, request.value)?;
        Ok((advance, session.snapshot()))
    })?;

    metrics::counter!("quiz.answers").increment(1);

    let response = match advance {
        Advance::Next {
            question_id,
            step,
            total_steps,
        } => AdvanceResponse {
            finished: false,
            route: state.quiz.route_for(&question_id),
            next_question_id: Some(question_id),
            step: Some(step),
            total_steps,
            session: snapshot,
        },
        Advance::Finished => {
            metrics::counter!("quiz.sessions.completed", "flow" => snapshot.flow.clone())
                .increment(1);
            info!(session_id = %session_id, flow = %snapshot.flow, "Quiz session finished");
            AdvanceResponse {
                finished: true,
                next_question_id: None,
                route: state.quiz.results_route.clone(),
                step: None,
                total_steps: snapshot.total_steps,
                session: snapshot,
            }
        }
    };

    Ok(Json(response))
}
