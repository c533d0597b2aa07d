// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Availability ---
        handlers::availability::availability,

        // --- Bookings ---
        handlers::bookings::index,
        handlers::bookings::show,
        handlers::bookings::store,
        handlers::bookings::confirm,
        handlers::bookings::cancel,
        handlers::bookings::done,
        handlers::bookings::update_time,

        // --- Blocks ---
        handlers::blocks::index,
        handlers::blocks::store,
        handlers::blocks::destroy,

        // --- Schedule ---
        handlers::schedule::show_staff_schedule,
        handlers::schedule::replace_staff_schedule,
        handlers::schedule::list_exceptions,
        handlers::schedule::create_exception,
        handlers::schedule::delete_exception,

        // --- Catalog ---
        handlers::catalog::list_services,
        handlers::catalog::create_service,
        handlers::catalog::list_staff,

        // --- Business ---
        handlers::business::show_settings,
        handlers::business::update_settings,

        // --- Public ---
        handlers::public::business_profile,
        handlers::public::services,
        handlers::public::staff,
        handlers::public::availability,
        handlers::public::store,
        handlers::public::show,
        handlers::public::verify_phone,
        handlers::public::cancel,
    ),
    components(
        schemas(
            // --- Modelos ---
            models::business::Business,
            models::business::BusinessType,
            models::catalog::User,
            models::catalog::UserRole,
            models::catalog::Service,
            models::catalog::Room,
            models::schedule::WeeklySchedule,
            models::schedule::ScheduleException,
            models::block::BookingBlock,
            models::booking::Booking,
            models::booking::BookingStatus,
            services::availability::Slot,
            services::availability::SlotRoom,

            // --- Payloads ---
            handlers::bookings::CreateBookingPayload,
            handlers::bookings::UpdateTimePayload,
            handlers::blocks::CreateBlockPayload,
            handlers::schedule::WeeklyRowPayload,
            handlers::schedule::ReplaceSchedulePayload,
            handlers::schedule::CreateExceptionPayload,
            handlers::catalog::CreateServicePayload,
            handlers::business::UpdateSettingsPayload,
            handlers::public::PublicBusinessProfile,
            handlers::public::PublicBusinessSettings,
            handlers::public::PublicStaffEntry,
            handlers::public::PublicCreateBookingPayload,
            handlers::public::PublicBookingCreated,
            handlers::public::VerifyPhonePayload,
            handlers::public::VerifyPhoneResponse,
        )
    ),
    tags(
        (name = "Availability", description = "Cálculo de horários livres"),
        (name = "Bookings", description = "Agendamentos (equipe)"),
        (name = "Blocks", description = "Intervalos fechados ad-hoc"),
        (name = "Schedule", description = "Grade semanal e exceções"),
        (name = "Catalog", description = "Serviços e equipe"),
        (name = "Business", description = "Configuração do estabelecimento"),
        (name = "Public", description = "Fluxo público de agendamento"),
    )
)]
pub struct ApiDoc;
