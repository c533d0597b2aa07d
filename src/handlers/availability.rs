// src/handlers/availability.rs

use axum::{Json, extract::{Query, State}, response::IntoResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    common::{error::ApiError, timefmt::parse_date},
    config::AppState,
    middleware::{i18n::Locale, tenancy::ActorContext},
    services::availability::Slot,
};

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub service_id: Uuid,
    pub staff_id: Option<Uuid>,
    /// "YYYY-MM-DD"
    pub date: String,
}

// GET /api/availability?service_id&staff_id&date
#[utoipa::path(
    get,
    path = "/api/availability",
    tag = "Availability",
    params(
        ("service_id" = Uuid, Query, description = "Serviço desejado"),
        ("staff_id" = Option<Uuid>, Query, description = "Profissional (padrão: primeiro agendável)"),
        ("date" = String, Query, description = "Data YYYY-MM-DD"),
        ("x-business-id" = Uuid, Header, description = "Tenant"),
    ),
    responses(
        (status = 200, description = "Slots livres do dia, em ordem crescente", body = [Slot])
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn availability(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // Caminho de leitura permissivo: data malformada = dia sem horários
    let Some(date) = parse_date(&query.date) else {
        return Ok(Json(Vec::<Slot>::new()));
    };

    let staff_id = match query.staff_id {
        Some(id) => Some(id),
        None => app_state
            .availability_service
            .default_staff(&app_state.db_pool, actor.business_id)
            .await
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?
            .map(|staff| staff.id),
    };
    let Some(staff_id) = staff_id else {
        return Ok(Json(Vec::<Slot>::new()));
    };

    let slots = app_state
        .availability_service
        .slots_for_day(
            &app_state.db_pool,
            actor.business_id,
            staff_id,
            query.service_id,
            date,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(slots))
}
