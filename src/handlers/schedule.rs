// src/handlers/schedule.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        i18n::I18nStore,
        timefmt::{parse_date, parse_time},
    },
    config::AppState,
    middleware::{i18n::Locale, tenancy::ActorContext},
    models::schedule::{ScheduleException, WeeklySchedule},
    services::schedule::{ExceptionInput, WeeklyRowInput},
};

// =============================================================================
//  1. GRADE SEMANAL POR PROFISSIONAL
// =============================================================================

// GET /api/staff/{id}/schedule
#[utoipa::path(
    get,
    path = "/api/staff/{id}/schedule",
    tag = "Schedule",
    params(
        ("id" = Uuid, Path, description = "Profissional"),
        ("x-business-id" = Uuid, Header, description = "Tenant"),
    ),
    responses(
        (status = 200, description = "Grade semanal (0=domingo)", body = [WeeklySchedule])
    )
)]
pub async fn show_staff_schedule(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Path(staff_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .schedule_service
        .staff_schedule(&app_state.db_pool, &actor, staff_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct WeeklyRowPayload {
    #[schema(example = 1)]
    pub day_of_week: i16,
    #[serde(default)]
    pub is_closed: bool,
    #[schema(example = "09:00")]
    pub starts_at: Option<String>,
    #[schema(example = "18:00")]
    pub ends_at: Option<String>,
    #[schema(example = "12:00")]
    pub break_start: Option<String>,
    #[schema(example = "13:00")]
    pub break_end: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReplaceSchedulePayload {
    #[validate(length(min = 1, message = "required"))]
    pub schedule: Vec<WeeklyRowPayload>,
}

// PUT /api/staff/{id}/schedule
#[utoipa::path(
    put,
    path = "/api/staff/{id}/schedule",
    tag = "Schedule",
    request_body = ReplaceSchedulePayload,
    params(
        ("id" = Uuid, Path, description = "Profissional"),
        ("x-business-id" = Uuid, Header, description = "Tenant"),
    ),
    responses(
        (status = 200, description = "Grade substituída integralmente", body = [WeeklySchedule]),
        (status = 403, description = "Só owner/manager")
    )
)]
pub async fn replace_staff_schedule(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Path(staff_id): Path<Uuid>,
    Json(payload): Json<ReplaceSchedulePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rows = Vec::with_capacity(payload.schedule.len());
    for row in payload.schedule {
        rows.push(WeeklyRowInput {
            day_of_week: row.day_of_week,
            is_closed: row.is_closed,
            starts_at: parse_opt_time(row.starts_at.as_deref(), "starts_at", &locale, &app_state.i18n_store)?,
            ends_at: parse_opt_time(row.ends_at.as_deref(), "ends_at", &locale, &app_state.i18n_store)?,
            break_start: parse_opt_time(row.break_start.as_deref(), "break_start", &locale, &app_state.i18n_store)?,
            break_end: parse_opt_time(row.break_end.as_deref(), "break_end", &locale, &app_state.i18n_store)?,
        });
    }

    let saved = app_state
        .schedule_service
        .replace_staff_schedule(&app_state.db_pool, &actor, staff_id, rows)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(saved))
}

// =============================================================================
//  2. EXCEÇÕES POR DATA (férias / feriado / horário especial)
// =============================================================================

// GET /api/exceptions
#[utoipa::path(
    get,
    path = "/api/exceptions",
    tag = "Schedule",
    params(
        ("x-business-id" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 200, description = "Exceções do estabelecimento", body = [ScheduleException])
    )
)]
pub async fn list_exceptions(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
) -> Result<impl IntoResponse, ApiError> {
    let exceptions = app_state
        .schedule_service
        .list_exceptions(&app_state.db_pool, &actor)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(exceptions))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateExceptionPayload {
    /// Nulo = exceção do estabelecimento inteiro
    pub staff_id: Option<Uuid>,

    #[schema(example = "2026-04-21")]
    pub date: String,

    pub is_closed: bool,

    #[schema(example = "10:00")]
    pub start: Option<String>,
    #[schema(example = "14:00")]
    pub end: Option<String>,
    pub break_start: Option<String>,
    pub break_end: Option<String>,

    #[validate(length(max = 255, message = "too_long"))]
    pub note: Option<String>,
}

// POST /api/exceptions  (upsert em (business, staff, date))
#[utoipa::path(
    post,
    path = "/api/exceptions",
    tag = "Schedule",
    request_body = CreateExceptionPayload,
    params(
        ("x-business-id" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 201, description = "Exceção criada/atualizada", body = ScheduleException),
        (status = 403, description = "Só owner/manager")
    )
)]
pub async fn create_exception(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Json(payload): Json<CreateExceptionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let date = parse_date(&payload.date).ok_or_else(|| {
        AppError::field_error("date", "invalid_date").to_api_error(&locale, &app_state.i18n_store)
    })?;

    let input = ExceptionInput {
        staff_id: payload.staff_id,
        date,
        is_closed: payload.is_closed,
        start: parse_opt_time(payload.start.as_deref(), "start", &locale, &app_state.i18n_store)?,
        end: parse_opt_time(payload.end.as_deref(), "end", &locale, &app_state.i18n_store)?,
        break_start: parse_opt_time(payload.break_start.as_deref(), "break_start", &locale, &app_state.i18n_store)?,
        break_end: parse_opt_time(payload.break_end.as_deref(), "break_end", &locale, &app_state.i18n_store)?,
        note: payload.note,
    };

    let exception = app_state
        .schedule_service
        .upsert_exception(&app_state.db_pool, &actor, input)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(exception)))
}

// DELETE /api/exceptions/{id}
#[utoipa::path(
    delete,
    path = "/api/exceptions/{id}",
    tag = "Schedule",
    params(
        ("id" = Uuid, Path, description = "ID da exceção"),
        ("x-business-id" = Uuid, Header, description = "Tenant"),
    ),
    responses(
        (status = 200, description = "Removida"),
        (status = 404, description = "Não existe neste tenant")
    )
)]
pub async fn delete_exception(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .schedule_service
        .delete_exception(&app_state.db_pool, &actor, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

// ---

fn parse_opt_time(
    raw: Option<&str>,
    field: &str,
    locale: &Locale,
    store: &I18nStore,
) -> Result<Option<NaiveTime>, ApiError> {
    match raw {
        None => Ok(None),
        Some(raw) => parse_time(raw)
            .map(Some)
            .ok_or_else(|| AppError::field_error(field, "invalid_time").to_api_error(locale, store)),
    }
}
