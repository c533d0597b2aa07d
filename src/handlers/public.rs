// src/handlers/public.rs

// Superfície pública (cliente anônimo, sem ActorContext). Tudo é resolvido
// pelo slug do estabelecimento ou pelo booking_code — nunca por IDs internos.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        timefmt::{parse_date, parse_datetime, wire_dt_opt},
    },
    config::AppState,
    middleware::i18n::Locale,
    models::{
        booking::Booking,
        business::{Business, BusinessType},
        catalog::{Service, UserRole},
    },
    services::{availability::Slot, public_booking::PublicBookingInput},
};

// =============================================================================
//  1. PERFIL PÚBLICO
// =============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct PublicBusinessProfile {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub business_type: BusinessType,
    pub work_start: Option<NaiveTime>,
    pub work_end: Option<NaiveTime>,
    pub timezone: String,
    pub settings: PublicBusinessSettings,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublicBusinessSettings {
    pub has_rooms: bool,
    pub has_patients: bool,
    pub phone_verification: bool,
}

impl PublicBusinessProfile {
    fn from_business(business: Business) -> Self {
        let has_rooms = business.business_type.has_rooms();
        Self {
            id: business.id,
            name: business.name,
            slug: business.slug,
            business_type: business.business_type,
            work_start: business.work_start,
            work_end: business.work_end,
            timezone: business.timezone,
            settings: PublicBusinessSettings {
                has_rooms,
                has_patients: has_rooms,
                phone_verification: true,
            },
        }
    }
}

// GET /api/public/businesses/{slug}
#[utoipa::path(
    get,
    path = "/api/public/businesses/{slug}",
    tag = "Public",
    params(("slug" = String, Path, description = "Slug do estabelecimento")),
    responses(
        (status = 200, body = PublicBusinessProfile),
        (status = 404, description = "Slug desconhecido")
    )
)]
pub async fn business_profile(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let business = app_state
        .public_service
        .business_by_slug(&app_state.db_pool, &slug)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(PublicBusinessProfile::from_business(business)))
}

// GET /api/public/businesses/{slug}/services
#[utoipa::path(
    get,
    path = "/api/public/businesses/{slug}/services",
    tag = "Public",
    params(("slug" = String, Path, description = "Slug do estabelecimento")),
    responses((status = 200, description = "Serviços ativos", body = [Service]))
)]
pub async fn services(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let business = app_state
        .public_service
        .business_by_slug(&app_state.db_pool, &slug)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let services = app_state
        .public_service
        .active_services(&app_state.db_pool, &business)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(services))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublicStaffEntry {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
}

// GET /api/public/businesses/{slug}/staff
#[utoipa::path(
    get,
    path = "/api/public/businesses/{slug}/staff",
    tag = "Public",
    params(("slug" = String, Path, description = "Slug do estabelecimento")),
    responses((status = 200, description = "Equipe agendável", body = [PublicStaffEntry]))
)]
pub async fn staff(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let business = app_state
        .public_service
        .business_by_slug(&app_state.db_pool, &slug)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let staff = app_state
        .public_service
        .bookable_staff(&app_state.db_pool, &business)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let entries: Vec<PublicStaffEntry> = staff
        .into_iter()
        .map(|user| PublicStaffEntry {
            id: user.id,
            name: user.name,
            role: user.role,
        })
        .collect();

    Ok(Json(entries))
}

// =============================================================================
//  2. DISPONIBILIDADE
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PublicAvailabilityQuery {
    pub service_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub date: String,
}

// GET /api/public/businesses/{slug}/availability
#[utoipa::path(
    get,
    path = "/api/public/businesses/{slug}/availability",
    tag = "Public",
    params(
        ("slug" = String, Path, description = "Slug do estabelecimento"),
        ("service_id" = Uuid, Query, description = "Serviço desejado"),
        ("staff_id" = Option<Uuid>, Query, description = "Profissional (padrão: primeiro agendável)"),
        ("date" = String, Query, description = "Data YYYY-MM-DD"),
    ),
    responses((status = 200, description = "Slots livres do dia", body = [Slot]))
)]
pub async fn availability(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
    Query(query): Query<PublicAvailabilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let business = app_state
        .public_service
        .business_by_slug(&app_state.db_pool, &slug)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let slots = match parse_date(&query.date) {
        None => Vec::new(),
        Some(date) => app_state
            .public_service
            .availability(
                &app_state.db_pool,
                &business,
                query.service_id,
                query.staff_id,
                date,
            )
            .await
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?,
    };

    // A lista é perecível: qualquer cache entre o cliente e cá mostraria
    // horários já consumidos.
    Ok((
        [
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate, max-age=0"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(slots),
    ))
}

// =============================================================================
//  3. CRIAÇÃO + VERIFICAÇÃO POR TELEFONE
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PublicCreateBookingPayload {
    pub service_id: Uuid,
    pub staff_id: Option<Uuid>,

    #[schema(example = "2026-03-10 09:30")]
    pub starts_at: String,

    #[validate(length(min = 2, max = 120, message = "invalid_length"))]
    #[schema(example = "Ana Paula")]
    pub client_name: String,

    #[validate(length(min = 5, max = 40, message = "invalid_length"))]
    #[schema(example = "+55 11 99999-8888")]
    pub client_phone: String,

    #[validate(length(max = 2000, message = "too_long"))]
    pub notes: Option<String>,

    pub room_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublicBookingCreated {
    #[schema(example = "BK-7Q2MX9AD")]
    pub booking_code: String,
    pub needs_phone_verification: bool,
    pub phone: String,
    #[serde(with = "wire_dt_opt")]
    #[schema(value_type = Option<String>)]
    pub expires_at: Option<NaiveDateTime>,
}

// POST /api/public/businesses/{slug}/bookings
#[utoipa::path(
    post,
    path = "/api/public/businesses/{slug}/bookings",
    tag = "Public",
    request_body = PublicCreateBookingPayload,
    params(("slug" = String, Path, description = "Slug do estabelecimento")),
    responses(
        (status = 201, description = "Criado pending; código OTP enviado", body = PublicBookingCreated),
        (status = 422, description = "Horário indisponível / validação")
    )
)]
pub async fn store(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
    Json(payload): Json<PublicCreateBookingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let starts_at = parse_datetime(&payload.starts_at).ok_or_else(|| {
        AppError::field_error("starts_at", "invalid_datetime")
            .to_api_error(&locale, &app_state.i18n_store)
    })?;

    let booking = app_state
        .public_service
        .create(
            &app_state.db_pool,
            &slug,
            PublicBookingInput {
                service_id: payload.service_id,
                staff_id: payload.staff_id,
                starts_at,
                client_name: payload.client_name,
                client_phone: payload.client_phone,
                notes: payload.notes,
                room_id: payload.room_id,
            },
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let response = PublicBookingCreated {
        booking_code: booking.booking_code.clone().unwrap_or_default(),
        needs_phone_verification: true,
        phone: booking.client_phone.clone(),
        expires_at: booking.phone_verification_expires_at,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

// GET /api/public/bookings/{code}
#[utoipa::path(
    get,
    path = "/api/public/bookings/{code}",
    tag = "Public",
    params(("code" = String, Path, description = "booking_code")),
    responses(
        (status = 200, body = Booking),
        (status = 404, description = "Código desconhecido")
    )
)]
pub async fn show(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .public_service
        .show(&app_state.db_pool, &code)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(booking))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyPhonePayload {
    #[validate(length(min = 4, max = 8, message = "invalid_length"))]
    #[schema(example = "4831")]
    pub otp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPhoneResponse {
    pub ok: bool,
    /// true quando o telefone já estava verificado (chamada repetida)
    pub already: bool,
    pub data: Booking,
}

// POST /api/public/bookings/{code}/verify
#[utoipa::path(
    post,
    path = "/api/public/bookings/{code}/verify",
    tag = "Public",
    request_body = VerifyPhonePayload,
    params(("code" = String, Path, description = "booking_code")),
    responses(
        (status = 200, description = "Verificado (ou já estava)", body = VerifyPhoneResponse),
        (status = 422, description = "Código errado ou expirado"),
        (status = 429, description = "Tentativas esgotadas")
    )
)]
pub async fn verify_phone(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(code): Path<String>,
    Json(payload): Json<VerifyPhonePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (booking, already) = app_state
        .public_service
        .verify_phone(&app_state.db_pool, &code, &payload.otp)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(VerifyPhoneResponse {
        ok: true,
        already,
        data: booking,
    }))
}

// POST /api/public/bookings/{code}/cancel
#[utoipa::path(
    post,
    path = "/api/public/bookings/{code}/cancel",
    tag = "Public",
    params(("code" = String, Path, description = "booking_code")),
    responses(
        (status = 200, description = "Cancelado (no-op se já terminal)", body = Booking)
    )
)]
pub async fn cancel(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .public_service
        .cancel(&app_state.db_pool, &code)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(booking))
}
