// src/services/booking.rs

// Caminho de escrita: as checagens do guard e o insert/update rodam na MESMA
// transação. Duas requisições simultâneas para o mesmo intervalo não passam
// as duas — a que perder a corrida cai na exclusion constraint e recebe o
// mesmo SlotTaken.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use rand::Rng;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        BookingRepository, BusinessRepository, CatalogRepository,
        booking_repo::{BookingFilters, NewBooking},
    },
    middleware::tenancy::ActorContext,
    models::{
        booking::{Booking, BookingStatus},
        schedule::TimeRange,
    },
    services::{conflict::ConflictGuard, notify::NotificationSink},
};

#[derive(Debug, Clone)]
pub struct CreateBookingInput {
    pub service_id: Uuid,
    pub staff_id: Uuid,
    pub starts_at: NaiveDateTime,
    pub client_name: String,
    pub client_phone: String,
    pub notes: Option<String>,
    /// Criação interna pode já nascer confirmada; o handler só deixa passar
    /// pending/confirmed.
    pub status: BookingStatus,
    pub room_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct BookingService {
    booking_repo: BookingRepository,
    catalog_repo: CatalogRepository,
    business_repo: BusinessRepository,
    guard: ConflictGuard,
    notifier: Arc<dyn NotificationSink>,
}

impl BookingService {
    pub fn new(
        booking_repo: BookingRepository,
        catalog_repo: CatalogRepository,
        business_repo: BusinessRepository,
        guard: ConflictGuard,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            booking_repo,
            catalog_repo,
            business_repo,
            guard,
            notifier,
        }
    }

    // =========================================================================
    //  CRIAÇÃO (equipe)
    // =========================================================================

    pub async fn create<'a, A>(
        &self,
        conn: A,
        actor: &ActorContext,
        input: CreateBookingInput,
    ) -> Result<Booking, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        let service = self
            .catalog_repo
            .find_service(&mut *tx, input.service_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("service".into()))?;
        actor.assert_same_business(service.business_id)?;

        let staff = self
            .catalog_repo
            .find_user(&mut *tx, input.staff_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("staff".into()))?;
        actor.assert_same_business(staff.business_id)?;

        if !staff.is_active || !staff.role.is_bookable() {
            return Err(AppError::field_error("staff_id", "invalid_staff"));
        }
        // staff só agenda para si mesmo
        if !actor.role.can_act_for_staff(actor.user_id, staff.id) {
            return Err(AppError::Forbidden);
        }

        if !service.duration_in_bounds() {
            return Err(AppError::InvalidServiceDuration);
        }

        // ends_at é derivado e congelado aqui (snapshot)
        let ends_at = input.starts_at + Duration::minutes(service.duration_minutes as i64);
        let range = TimeRange::new(input.starts_at, ends_at);

        let business_id = service.business_id;
        let business = self
            .business_repo
            .find_by_id(&mut *tx, business_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("business".into()))?;

        // Sala só em clínica, e só se for do mesmo estabelecimento
        let room_id = match (business.business_type.has_rooms(), input.room_id) {
            (true, Some(room_id)) => {
                let room = self
                    .catalog_repo
                    .find_room(&mut *tx, business_id, room_id)
                    .await?
                    .ok_or_else(|| AppError::ResourceNotFound("room".into()))?;
                Some(room.id)
            }
            _ => None,
        };

        self.guard
            .assert_within_schedule(&mut *tx, &business, staff.id, &range)
            .await?;
        self.guard
            .assert_no_overlap(&mut *tx, business_id, staff.id, &range, None)
            .await?;
        self.guard
            .assert_not_blocked(&mut *tx, business_id, staff.id, &range)
            .await?;

        let booking_code = self.unique_booking_code(&mut *tx).await?;

        let booking = self
            .booking_repo
            .insert(
                &mut *tx,
                NewBooking {
                    business_id,
                    service_id: service.id,
                    staff_id: staff.id,
                    room_id,
                    client_name: &input.client_name,
                    client_phone: &input.client_phone,
                    starts_at: range.start,
                    ends_at: range.end,
                    status: input.status,
                    notes: input.notes.as_deref(),
                    booking_code: &booking_code,
                    final_price: Some(service.price),
                    currency: &service.currency,
                    phone_verification_code_hash: None,
                    phone_verification_expires_at: None,
                },
            )
            .await?;

        tx.commit().await?;

        self.notifier.booking_created(&booking).await;

        Ok(booking)
    }

    // =========================================================================
    //  REAGENDAMENTO
    // =========================================================================

    /// Move o intervalo revalidando sobreposição e bloqueios (ignorando o
    /// próprio agendamento), tudo na transação do update.
    pub async fn reschedule<'a, A>(
        &self,
        conn: A,
        actor: &ActorContext,
        booking_id: Uuid,
        range: TimeRange,
    ) -> Result<Booking, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        if range.end <= range.start {
            return Err(AppError::InvalidRange);
        }

        let mut tx = conn.begin().await?;

        let booking = self
            .booking_repo
            .find_in_business(&mut *tx, actor.business_id, booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("booking".into()))?;

        if !actor.role.can_act_for_staff(actor.user_id, booking.staff_id) {
            return Err(AppError::Forbidden);
        }

        self.guard
            .assert_no_overlap(&mut *tx, booking.business_id, booking.staff_id, &range, Some(booking.id))
            .await?;
        self.guard
            .assert_not_blocked(&mut *tx, booking.business_id, booking.staff_id, &range)
            .await?;

        let updated = self.booking_repo.update_time(&mut *tx, booking.id, &range).await?;
        tx.commit().await?;

        Ok(updated)
    }

    // =========================================================================
    //  MÁQUINA DE ESTADOS
    // =========================================================================

    /// A checagem de posse (tenant, depois staff) vem ANTES da de estado:
    /// quem não enxerga o agendamento recebe 404/403, nunca o estado.
    pub async fn transition<'a, A>(
        &self,
        conn: A,
        actor: &ActorContext,
        booking_id: Uuid,
        next: BookingStatus,
    ) -> Result<Booking, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        let booking = self
            .booking_repo
            .find_in_business(&mut *tx, actor.business_id, booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("booking".into()))?;

        if !actor.role.can_act_for_staff(actor.user_id, booking.staff_id) {
            return Err(AppError::Forbidden);
        }

        if !booking.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition);
        }

        let updated = self.booking_repo.update_status(&mut *tx, booking.id, next).await?;
        tx.commit().await?;

        Ok(updated)
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn list<'a, A>(
        &self,
        conn: A,
        actor: &ActorContext,
        mut filters: BookingFilters,
    ) -> Result<Vec<Booking>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        // staff só enxerga a própria agenda
        if actor.role == crate::models::catalog::UserRole::Staff {
            filters.staff_id = Some(actor.user_id);
        }

        let mut conn = conn.acquire().await?;
        self.booking_repo.list(&mut *conn, actor.business_id, &filters).await
    }

    pub async fn show<'a, A>(
        &self,
        conn: A,
        actor: &ActorContext,
        booking_id: Uuid,
    ) -> Result<Booking, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.booking_repo
            .find_in_business(&mut *conn, actor.business_id, booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("booking".into()))
    }

    // ---

    async fn unique_booking_code(
        &self,
        tx: &mut sqlx::PgConnection,
    ) -> Result<String, AppError> {
        loop {
            let code = random_booking_code();
            if !self.booking_repo.code_exists(&mut *tx, &code).await? {
                return Ok(code);
            }
        }
    }
}

/// "BK-" + 8 caracteres sem ambiguidade visual (sem 0/O, 1/I).
pub(crate) fn random_booking_code() -> String {
    const CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..8)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect();
    format!("BK-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_code_shape() {
        let code = random_booking_code();
        assert!(code.starts_with("BK-"));
        assert_eq!(code.len(), 11);
        assert!(code[3..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert!(!code.contains('0') && !code.contains('O') && !code.contains('1'));
    }
}
