// src/handlers/blocks.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Duration;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        timefmt::{parse_date, parse_datetime},
    },
    config::AppState,
    middleware::{i18n::Locale, tenancy::ActorContext},
    models::{block::BookingBlock, schedule::TimeRange},
};

#[derive(Debug, Deserialize)]
pub struct IndexBlocksQuery {
    /// "YYYY-MM-DD"
    pub from: String,
    pub to: String,
    pub staff_id: Option<Uuid>,
}

// GET /api/calendar/blocks?from&to&staff_id
#[utoipa::path(
    get,
    path = "/api/calendar/blocks",
    tag = "Blocks",
    params(
        ("from" = String, Query, description = "Início YYYY-MM-DD"),
        ("to" = String, Query, description = "Fim YYYY-MM-DD (inclusivo)"),
        ("staff_id" = Option<Uuid>, Query, description = "Só bloqueios deste profissional"),
        ("x-business-id" = Uuid, Header, description = "Tenant"),
    ),
    responses(
        (status = 200, description = "Bloqueios cruzando o intervalo", body = [BookingBlock])
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Query(query): Query<IndexBlocksQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let from = parse_date(&query.from).ok_or_else(|| {
        AppError::field_error("from", "invalid_date").to_api_error(&locale, &app_state.i18n_store)
    })?;
    let to = parse_date(&query.to).ok_or_else(|| {
        AppError::field_error("to", "invalid_date").to_api_error(&locale, &app_state.i18n_store)
    })?;

    let from_dt = from.and_hms_opt(0, 0, 0).expect("midnight");
    let to_dt = (to + Duration::days(1)).and_hms_opt(0, 0, 0).expect("midnight");

    let blocks = app_state
        .block_service
        .list_range(&app_state.db_pool, &actor, from_dt, to_dt, query.staff_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(blocks))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBlockPayload {
    #[schema(example = "2026-03-10 12:00")]
    pub starts_at: String,
    #[schema(example = "2026-03-10 13:00")]
    pub ends_at: String,

    #[validate(length(max = 190, message = "too_long"))]
    #[schema(example = "Almoço")]
    pub reason: Option<String>,

    /// Nulo = bloqueia todos os profissionais
    pub staff_id: Option<Uuid>,
}

// POST /api/calendar/blocks
#[utoipa::path(
    post,
    path = "/api/calendar/blocks",
    tag = "Blocks",
    request_body = CreateBlockPayload,
    params(
        ("x-business-id" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 201, description = "Bloqueio criado", body = BookingBlock),
        (status = 422, description = "Intervalo inválido / vão > 14 dias / sobreposição")
    )
)]
pub async fn store(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Json(payload): Json<CreateBlockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let starts_at = parse_datetime(&payload.starts_at).ok_or_else(|| {
        AppError::field_error("starts_at", "invalid_datetime")
            .to_api_error(&locale, &app_state.i18n_store)
    })?;
    let ends_at = parse_datetime(&payload.ends_at).ok_or_else(|| {
        AppError::field_error("ends_at", "invalid_datetime")
            .to_api_error(&locale, &app_state.i18n_store)
    })?;

    let block = app_state
        .block_service
        .create(
            &app_state.db_pool,
            &actor,
            payload.staff_id,
            TimeRange::new(starts_at, ends_at),
            payload.reason.as_deref(),
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(block)))
}

// DELETE /api/calendar/blocks/{id}
#[utoipa::path(
    delete,
    path = "/api/calendar/blocks/{id}",
    tag = "Blocks",
    params(
        ("id" = Uuid, Path, description = "ID do bloqueio"),
        ("x-business-id" = Uuid, Header, description = "Tenant"),
    ),
    responses(
        (status = 200, description = "Removido; agendamentos existentes não são revalidados"),
        (status = 404, description = "Não existe neste tenant")
    )
)]
pub async fn destroy(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .block_service
        .delete(&app_state.db_pool, &actor, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
