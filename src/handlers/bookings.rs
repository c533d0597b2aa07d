// src/handlers/bookings.rs

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
    db::booking_repo::BookingFilters,
    middleware::{i18n::Locale, tenancy::ActorContext},
    models::{booking::{Booking, BookingStatus}, schedule::TimeRange},
    services::booking::CreateBookingInput,
};

// =============================================================================
//  1. LISTAGEM / CONSULTA
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct IndexBookingsQuery {
    /// Dia exato ("YYYY-MM-DD")
    pub date: Option<String>,
    /// Intervalo [from, to] em dias
    pub from: Option<String>,
    pub to: Option<String>,
    pub status: Option<BookingStatus>,
    pub staff_id: Option<Uuid>,
    /// Inclui agendamentos públicos ainda sem telefone verificado
    #[serde(default)]
    pub include_unverified: bool,
}

// GET /api/bookings
#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "Bookings",
    params(
        ("date" = Option<String>, Query, description = "Filtra por dia YYYY-MM-DD"),
        ("from" = Option<String>, Query, description = "Início do intervalo YYYY-MM-DD"),
        ("to" = Option<String>, Query, description = "Fim do intervalo YYYY-MM-DD"),
        ("status" = Option<String>, Query, description = "pending|confirmed|done|cancelled"),
        ("staff_id" = Option<Uuid>, Query, description = "Filtra por profissional"),
        ("include_unverified" = Option<bool>, Query, description = "Mostra públicos não verificados"),
        ("x-business-id" = Uuid, Header, description = "Tenant"),
    ),
    responses(
        (status = 200, description = "Agendamentos do estabelecimento", body = [Booking])
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Query(query): Query<IndexBookingsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut filters = BookingFilters {
        staff_id: query.staff_id,
        status: query.status,
        include_unverified: query.include_unverified,
        ..Default::default()
    };

    if let Some(raw) = &query.date {
        let date = parse_date(raw).ok_or_else(|| {
            AppError::field_error("date", "invalid_date").to_api_error(&locale, &app_state.i18n_store)
        })?;
        filters.date = Some(date);
    }

    // from/to viram um intervalo semiaberto [from 00:00, to+1d 00:00)
    if let (Some(from_raw), Some(to_raw)) = (&query.from, &query.to) {
        let from = parse_date(from_raw).ok_or_else(|| {
            AppError::field_error("from", "invalid_date").to_api_error(&locale, &app_state.i18n_store)
        })?;
        let to = parse_date(to_raw).ok_or_else(|| {
            AppError::field_error("to", "invalid_date").to_api_error(&locale, &app_state.i18n_store)
        })?;
        filters.from = from.and_hms_opt(0, 0, 0);
        filters.to = (to + Duration::days(1)).and_hms_opt(0, 0, 0);
    }

    let bookings = app_state
        .booking_service
        .list(&app_state.db_pool, &actor, filters)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(bookings))
}

// GET /api/bookings/{id}
#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    params(
        ("id" = Uuid, Path, description = "ID do agendamento"),
        ("x-business-id" = Uuid, Header, description = "Tenant"),
    ),
    responses(
        (status = 200, body = Booking),
        (status = 404, description = "Não existe neste tenant")
    )
)]
pub async fn show(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .booking_service
        .show(&app_state.db_pool, &actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(booking))
}

// =============================================================================
//  2. CRIAÇÃO (equipe)
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingPayload {
    pub service_id: Uuid,
    pub staff_id: Uuid,

    #[schema(example = "2026-03-10 09:30")]
    pub starts_at: String,

    #[validate(length(min = 2, max = 120, message = "invalid_length"))]
    #[schema(example = "Ana Paula")]
    pub client_name: String,

    #[validate(length(min = 5, max = 40, message = "invalid_length"))]
    #[schema(example = "+5511999998888")]
    pub client_phone: String,

    #[validate(length(max = 2000, message = "too_long"))]
    pub notes: Option<String>,

    /// pending (padrão) ou confirmed
    pub status: Option<BookingStatus>,

    /// Só em clínicas
    pub room_id: Option<Uuid>,
}

// POST /api/bookings
#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "Bookings",
    request_body = CreateBookingPayload,
    params(
        ("x-business-id" = Uuid, Header, description = "Tenant")
    ),
    responses(
        (status = 201, description = "Agendamento criado", body = Booking),
        (status = 422, description = "Conflito de horário / validação")
    )
)]
pub async fn store(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let starts_at = parse_datetime(&payload.starts_at).ok_or_else(|| {
        AppError::field_error("starts_at", "invalid_datetime")
            .to_api_error(&locale, &app_state.i18n_store)
    })?;

    let status = match payload.status {
        None => BookingStatus::Pending,
        Some(status @ (BookingStatus::Pending | BookingStatus::Confirmed)) => status,
        Some(_) => {
            return Err(AppError::field_error("status", "invalid_initial_status")
                .to_api_error(&locale, &app_state.i18n_store));
        }
    };

    let booking = app_state
        .booking_service
        .create(
            &app_state.db_pool,
            &actor,
            CreateBookingInput {
                service_id: payload.service_id,
                staff_id: payload.staff_id,
                starts_at,
                client_name: payload.client_name,
                client_phone: payload.client_phone,
                notes: payload.notes,
                status,
                room_id: payload.room_id,
            },
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(booking)))
}

// =============================================================================
//  3. MÁQUINA DE ESTADOS
// =============================================================================

// PATCH /api/bookings/{id}/confirm
#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/confirm",
    tag = "Bookings",
    params(
        ("id" = Uuid, Path, description = "ID do agendamento"),
        ("x-business-id" = Uuid, Header, description = "Tenant"),
    ),
    responses(
        (status = 200, description = "Confirmado", body = Booking),
        (status = 422, description = "Só pending confirma")
    )
)]
pub async fn confirm(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    transition(app_state, locale, actor, id, BookingStatus::Confirmed).await
}

// PATCH /api/bookings/{id}/cancel
#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/cancel",
    tag = "Bookings",
    params(
        ("id" = Uuid, Path, description = "ID do agendamento"),
        ("x-business-id" = Uuid, Header, description = "Tenant"),
    ),
    responses(
        (status = 200, description = "Cancelado", body = Booking),
        (status = 422, description = "Só pending/confirmed cancela")
    )
)]
pub async fn cancel(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    transition(app_state, locale, actor, id, BookingStatus::Cancelled).await
}

// PATCH /api/bookings/{id}/done
#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/done",
    tag = "Bookings",
    params(
        ("id" = Uuid, Path, description = "ID do agendamento"),
        ("x-business-id" = Uuid, Header, description = "Tenant"),
    ),
    responses(
        (status = 200, description = "Concluído", body = Booking),
        (status = 422, description = "Só confirmed conclui")
    )
)]
pub async fn done(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    transition(app_state, locale, actor, id, BookingStatus::Done).await
}

async fn transition(
    app_state: AppState,
    locale: Locale,
    actor: ActorContext,
    id: Uuid,
    next: BookingStatus,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let booking = app_state
        .booking_service
        .transition(&app_state.db_pool, &actor, id, next)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(booking)))
}

// =============================================================================
//  4. REAGENDAMENTO
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTimePayload {
    #[schema(example = "2026-03-10 14:00:00")]
    pub starts_at: String,
    #[schema(example = "2026-03-10 15:00:00")]
    pub ends_at: String,
}

// PATCH /api/bookings/{id}/time
#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/time",
    tag = "Bookings",
    request_body = UpdateTimePayload,
    params(
        ("id" = Uuid, Path, description = "ID do agendamento"),
        ("x-business-id" = Uuid, Header, description = "Tenant"),
    ),
    responses(
        (status = 200, description = "Horário movido, revalidado", body = Booking),
        (status = 422, description = "Conflito / intervalo inválido")
    )
)]
pub async fn update_time(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTimePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let starts_at = parse_datetime(&payload.starts_at).ok_or_else(|| {
        AppError::field_error("starts_at", "invalid_datetime")
            .to_api_error(&locale, &app_state.i18n_store)
    })?;
    let ends_at = parse_datetime(&payload.ends_at).ok_or_else(|| {
        AppError::field_error("ends_at", "invalid_datetime")
            .to_api_error(&locale, &app_state.i18n_store)
    })?;

    let booking = app_state
        .booking_service
        .reschedule(&app_state.db_pool, &actor, id, TimeRange::new(starts_at, ends_at))
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(booking))
}
