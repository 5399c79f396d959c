use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use super::state::AppState;
use crate::{
    access::Caller,
    error::AppError,
    manager::{SessionDetail, StudentHistory},
    models::{
        AttendanceRecord, Cohort, HistoryFilter, MarkAttendance, OpenSession, RecordFilter, Role,
        Session, SessionStatus, User,
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct SessionListQuery {
    pub status: Option<SessionStatus>,
    pub limit: Option<i64>,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn open_session_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Result<Json<OpenSession>, JsonRejection>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    caller.require(&[Role::Faculty])?;
    let request = json_body(payload)?;

    let session = state
        .with_store(move |manager| manager.open_session(&caller.id, &request))
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn close_session_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, AppError> {
    caller.require(&[Role::Faculty])?;

    let session = state
        .with_store(move |manager| manager.close_session(&session_id, &caller.id))
        .await?;

    Ok(Json(session))
}

pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: Result<Query<SessionListQuery>, QueryRejection>,
) -> Result<Json<Vec<Session>>, AppError> {
    caller.require(&[Role::Faculty])?;
    let params = query(params)?;
    let limit = state.settings.session_limit(params.limit);

    let sessions = state
        .with_store(move |manager| manager.list_sessions(&caller.id, params.status, limit))
        .await?;

    Ok(Json(sessions))
}

pub async fn session_detail_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(session_id): Path<String>,
) -> Result<Json<SessionDetail>, AppError> {
    let detail = state
        .with_store(move |manager| manager.session_detail(&session_id, &caller))
        .await?;

    Ok(Json(detail))
}

pub async fn mark_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Result<Json<MarkAttendance>, JsonRejection>,
) -> Result<(StatusCode, Json<AttendanceRecord>), AppError> {
    caller.require(&[Role::Faculty])?;
    let request = json_body(payload)?;

    let marked = state
        .with_store(move |manager| manager.mark(&caller.id, &request))
        .await?;
    let status = if marked.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(marked.record)))
}

pub async fn student_history_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(student_id): Path<String>,
    params: Result<Query<HistoryFilter>, QueryRejection>,
) -> Result<Json<StudentHistory>, AppError> {
    let filter = query(params)?;

    let history = state
        .with_store(move |manager| manager.student_history(&caller, &student_id, filter))
        .await?;

    Ok(Json(history))
}

pub async fn report_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: Result<Query<RecordFilter>, QueryRejection>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    caller.require(&[Role::Faculty, Role::Admin])?;
    let filter = query(params)?;

    let records = state
        .with_store(move |manager| manager.report(&caller, filter))
        .await?;

    Ok(Json(records))
}

pub async fn cohort_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    params: Result<Query<Cohort>, QueryRejection>,
) -> Result<Json<Vec<User>>, AppError> {
    caller.require(&[Role::Faculty, Role::Admin])?;
    let cohort = query(params)?;

    let students = state
        .with_store(move |manager| manager.cohort(&cohort))
        .await?;

    Ok(Json(students))
}
