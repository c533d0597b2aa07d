// src/services/conflict.rs

// Guard de conflito: as MESMAS checagens que o motor de disponibilidade usa
// para filtrar candidatos rodam aqui como imposição dura, dentro da transação
// do insert/update — fechando a janela de corrida entre exibir um slot e
// consumi-lo. O backstop final é a exclusion constraint do storage.

use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BlockRepository, BookingRepository},
    models::{business::Business, schedule::TimeRange},
    services::schedule::ScheduleService,
};

#[derive(Clone)]
pub struct ConflictGuard {
    booking_repo: BookingRepository,
    block_repo: BlockRepository,
    schedule_service: ScheduleService,
}

impl ConflictGuard {
    pub fn new(
        booking_repo: BookingRepository,
        block_repo: BlockRepository,
        schedule_service: ScheduleService,
    ) -> Self {
        Self {
            booking_repo,
            block_repo,
            schedule_service,
        }
    }

    /// Reconsulta agendamentos não-cancelados do profissional cruzando
    /// [start, end); em update, o próprio agendamento é ignorado.
    pub async fn assert_no_overlap<'a, A>(
        &self,
        conn: A,
        business_id: Uuid,
        staff_id: Uuid,
        range: &TimeRange,
        ignore_booking_id: Option<Uuid>,
    ) -> Result<(), AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        let taken = self
            .booking_repo
            .overlap_exists(&mut *conn, business_id, staff_id, range, ignore_booking_id)
            .await?;

        if taken {
            return Err(AppError::SlotTaken);
        }
        Ok(())
    }

    pub async fn assert_not_blocked<'a, A>(
        &self,
        conn: A,
        business_id: Uuid,
        staff_id: Uuid,
        range: &TimeRange,
    ) -> Result<(), AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        let blocked = self
            .block_repo
            .is_blocked(&mut *conn, business_id, staff_id, range)
            .await?;

        if blocked {
            return Err(AppError::TimeBlocked);
        }
        Ok(())
    }

    /// O intervalo precisa caber na janela resolvida do dia e não pode cruzar
    /// a pausa. Usado pelo caminho interno de criação; o fluxo público já
    /// valida contra um slot exibido.
    pub async fn assert_within_schedule<'a, A>(
        &self,
        conn: A,
        business: &Business,
        staff_id: Uuid,
        range: &TimeRange,
    ) -> Result<(), AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        let window = self
            .schedule_service
            .effective_window(&mut *conn, business, staff_id, range.start.date())
            .await?
            .ok_or(AppError::OutsideWorkingHours)?;

        if !window.range.contains(range) {
            return Err(AppError::OutsideWorkingHours);
        }
        if let Some(break_range) = &window.break_range {
            if break_range.overlaps(range) {
                return Err(AppError::OutsideWorkingHours);
            }
        }
        Ok(())
    }
}
