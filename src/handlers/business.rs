// src/handlers/business.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        timefmt::parse_time,
    },
    config::AppState,
    middleware::{i18n::Locale, tenancy::ActorContext},
    models::business::{Business, parse_utc_offset},
};

// GET /api/business/settings
#[utoipa::path(
    get,
    path = "/api/business/settings",
    tag = "Business",
    params(
        ("x-business-id" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 200, description = "Configuração de calendário do estabelecimento", body = Business)
    )
)]
pub async fn show_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
) -> Result<impl IntoResponse, ApiError> {
    let business = app_state
        .business_repo
        .find_by_id(&app_state.db_pool, actor.business_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?
        .ok_or_else(|| {
            AppError::ResourceNotFound("business".into()).to_api_error(&locale, &app_state.i18n_store)
        })?;

    Ok(Json(business))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSettingsPayload {
    #[schema(example = "09:00")]
    pub work_start: Option<String>,
    #[schema(example = "18:00")]
    pub work_end: Option<String>,

    /// Granularidade da grade, em minutos ∈ [5, 60]
    #[validate(range(min = 5, max = 60, message = "out_of_range"))]
    #[schema(example = 15)]
    pub slot_step_minutes: Option<i16>,

    /// Offset UTC fixo, ex.: "-03:00"
    #[schema(example = "-03:00")]
    pub timezone: Option<String>,
}

// PATCH /api/business/settings
#[utoipa::path(
    patch,
    path = "/api/business/settings",
    tag = "Business",
    request_body = UpdateSettingsPayload,
    params(
        ("x-business-id" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 200, description = "Configuração atualizada", body = Business),
        (status = 403, description = "Só owner/manager")
    )
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Json(payload): Json<UpdateSettingsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    if !actor.role.can_manage_schedule() {
        return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
    }

    let work_start = match payload.work_start.as_deref() {
        None => None,
        Some(raw) => Some(parse_time(raw).ok_or_else(|| {
            AppError::field_error("work_start", "invalid_time")
                .to_api_error(&locale, &app_state.i18n_store)
        })?),
    };
    let work_end = match payload.work_end.as_deref() {
        None => None,
        Some(raw) => Some(parse_time(raw).ok_or_else(|| {
            AppError::field_error("work_end", "invalid_time")
                .to_api_error(&locale, &app_state.i18n_store)
        })?),
    };

    if let Some(tz) = payload.timezone.as_deref() {
        if parse_utc_offset(tz).is_none() {
            return Err(AppError::field_error("timezone", "invalid_offset")
                .to_api_error(&locale, &app_state.i18n_store));
        }
    }

    let business = app_state
        .business_repo
        .update_calendar_settings(
            &app_state.db_pool,
            actor.business_id,
            work_start,
            work_end,
            payload.slot_step_minutes,
            payload.timezone.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(business))
}
