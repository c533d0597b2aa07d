// src/handlers/catalog.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::ActorContext},
    models::catalog::{Service, User},
};

// =============================================================================
//  1. SERVIÇOS
// =============================================================================

// GET /api/services
#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Catalog",
    params(
        ("x-business-id" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 200, description = "Serviços do estabelecimento", body = [Service])
    )
)]
pub async fn list_services(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
) -> Result<impl IntoResponse, ApiError> {
    let services = app_state
        .catalog_repo
        .list_services(&app_state.db_pool, actor.business_id, false)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(services))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateServicePayload {
    #[validate(length(min = 1, max = 190, message = "invalid_length"))]
    #[schema(example = "Corte e finalização")]
    pub name: String,

    /// Minutos, dentro de [5, 600]
    #[validate(range(min = 5, max = 600, message = "out_of_range"))]
    #[schema(example = 60)]
    pub duration_minutes: i32,

    #[schema(example = "90.00")]
    pub price: Decimal,

    #[validate(length(min = 3, max = 10, message = "invalid_length"))]
    #[schema(example = "BRL")]
    pub currency: Option<String>,
}

// POST /api/services
#[utoipa::path(
    post,
    path = "/api/services",
    tag = "Catalog",
    request_body = CreateServicePayload,
    params(
        ("x-business-id" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 201, description = "Serviço criado", body = Service),
        (status = 403, description = "Só owner/manager")
    )
)]
pub async fn create_service(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Json(payload): Json<CreateServicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    if !actor.role.can_manage_schedule() {
        return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
    }

    let service = app_state
        .catalog_repo
        .create_service(
            &app_state.db_pool,
            actor.business_id,
            &payload.name,
            payload.duration_minutes,
            payload.price,
            payload.currency.as_deref().unwrap_or("BRL"),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(service)))
}

// =============================================================================
//  2. EQUIPE
// =============================================================================

// GET /api/staff
#[utoipa::path(
    get,
    path = "/api/staff",
    tag = "Catalog",
    params(
        ("x-business-id" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 200, description = "Equipe agendável ativa", body = [User])
    )
)]
pub async fn list_staff(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
) -> Result<impl IntoResponse, ApiError> {
    let staff = app_state
        .catalog_repo
        .list_bookable_staff(&app_state.db_pool, actor.business_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(staff))
}
