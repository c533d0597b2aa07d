// src/services/schedule.rs

use chrono::{Datelike, NaiveDate, NaiveTime};
use sqlx::{Acquire, Connection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, ScheduleRepository},
    middleware::tenancy::ActorContext,
    models::{
        business::{Business, CalendarConfig},
        catalog::User,
        schedule::{EffectiveWindow, ScheduleException, WeeklySchedule, resolve_window},
    },
};

/// Linha da grade semanal como chega do handler, já com horários parseados.
#[derive(Debug, Clone)]
pub struct WeeklyRowInput {
    pub day_of_week: i16,
    pub is_closed: bool,
    pub starts_at: Option<NaiveTime>,
    pub ends_at: Option<NaiveTime>,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
}

#[derive(Debug, Clone)]
pub struct ExceptionInput {
    pub staff_id: Option<Uuid>,
    pub date: NaiveDate,
    pub is_closed: bool,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub note: Option<String>,
}

#[derive(Clone)]
pub struct ScheduleService {
    schedule_repo: ScheduleRepository,
    catalog_repo: CatalogRepository,
}

impl ScheduleService {
    pub fn new(schedule_repo: ScheduleRepository, catalog_repo: CatalogRepository) -> Self {
        Self {
            schedule_repo,
            catalog_repo,
        }
    }

    // =========================================================================
    //  RESOLUÇÃO DA JANELA EFETIVA
    // =========================================================================

    /// Janela de trabalho de um profissional em uma data, já com exceções e
    /// fallback aplicados. É a fonte única usada pelo motor de disponibilidade
    /// e pelo guard de conflito.
    pub async fn effective_window<'a, A>(
        &self,
        conn: A,
        business: &Business,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<EffectiveWindow>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let staff = self
            .catalog_repo
            .find_user(&mut *conn, staff_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("staff".into()))?;
        if staff.business_id != business.id {
            return Err(AppError::TenantMismatch);
        }

        // 0=domingo ... 6=sábado, como na grade
        let day_of_week = date.weekday().num_days_from_sunday() as i16;

        let staff_exception = self
            .schedule_repo
            .find_exception(&mut *conn, business.id, Some(staff_id), date)
            .await?;
        let business_exception = self
            .schedule_repo
            .find_exception(&mut *conn, business.id, None, date)
            .await?;
        let weekly = self
            .schedule_repo
            .weekly_for_day(&mut *conn, staff_id, day_of_week)
            .await?;
        let has_weekly_rows = self.schedule_repo.has_weekly_rows(&mut *conn, staff_id).await?;

        let config = CalendarConfig::for_business(business);

        Ok(resolve_window(
            date,
            staff_exception.as_ref(),
            business_exception.as_ref(),
            weekly.as_ref(),
            has_weekly_rows,
            &config,
        ))
    }

    // =========================================================================
    //  GRADE SEMANAL (CRUD)
    // =========================================================================

    pub async fn staff_schedule<'a, A>(
        &self,
        conn: A,
        actor: &ActorContext,
        staff_id: Uuid,
    ) -> Result<Vec<WeeklySchedule>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.assert_staff_in_business(&mut conn, actor, staff_id).await?;
        self.schedule_repo.weekly_for_staff(&mut *conn, staff_id).await
    }

    /// Substituição integral da grade do profissional (semântica do PUT).
    pub async fn replace_staff_schedule<'a, A>(
        &self,
        conn: A,
        actor: &ActorContext,
        staff_id: Uuid,
        rows: Vec<WeeklyRowInput>,
    ) -> Result<Vec<WeeklySchedule>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        if !actor.role.can_manage_schedule() {
            return Err(AppError::Forbidden);
        }

        let mut conn = conn.acquire().await?;
        let staff = self.assert_staff_in_business(&mut conn, actor, staff_id).await?;

        for row in &rows {
            if !(0..=6).contains(&row.day_of_week) {
                return Err(AppError::field_error("day_of_week", "out_of_range"));
            }
            if !row.is_closed {
                match (row.starts_at, row.ends_at) {
                    (Some(start), Some(end)) if start < end => {}
                    _ => return Err(AppError::field_error("starts_at", "must_be_before_ends_at")),
                }
            }
        }

        let mut tx = sqlx::Acquire::begin(&mut *conn).await?;
        self.schedule_repo.delete_weekly_for_staff(&mut *tx, staff_id).await?;

        let mut saved = Vec::with_capacity(rows.len());
        for row in rows {
            let inserted = self
                .schedule_repo
                .insert_weekly_row(
                    &mut *tx,
                    staff.business_id,
                    staff_id,
                    row.day_of_week,
                    if row.is_closed { None } else { row.starts_at },
                    if row.is_closed { None } else { row.ends_at },
                    row.break_start,
                    row.break_end,
                    row.is_closed,
                )
                .await?;
            saved.push(inserted);
        }
        tx.commit().await?;

        Ok(saved)
    }

    // =========================================================================
    //  EXCEÇÕES
    // =========================================================================

    pub async fn list_exceptions<'a, A>(
        &self,
        conn: A,
        actor: &ActorContext,
    ) -> Result<Vec<ScheduleException>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.schedule_repo.list_exceptions(&mut *conn, actor.business_id).await
    }

    pub async fn upsert_exception<'a, A>(
        &self,
        conn: A,
        actor: &ActorContext,
        input: ExceptionInput,
    ) -> Result<ScheduleException, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        if !actor.role.can_manage_schedule() {
            return Err(AppError::Forbidden);
        }

        let mut conn = conn.acquire().await?;

        if let Some(staff_id) = input.staff_id {
            self.assert_staff_in_business(&mut conn, actor, staff_id).await?;
        }

        if !input.is_closed {
            match (input.start, input.end) {
                (Some(start), Some(end)) if start < end => {}
                _ => return Err(AppError::field_error("start", "must_be_before_end")),
            }
        }

        self.schedule_repo
            .upsert_exception(
                &mut *conn,
                actor.business_id,
                input.staff_id,
                input.date,
                input.is_closed,
                if input.is_closed { None } else { input.start },
                if input.is_closed { None } else { input.end },
                input.break_start,
                input.break_end,
                input.note.as_deref(),
            )
            .await
    }

    pub async fn delete_exception<'a, A>(
        &self,
        conn: A,
        actor: &ActorContext,
        exception_id: Uuid,
    ) -> Result<(), AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        if !actor.role.can_manage_schedule() {
            return Err(AppError::Forbidden);
        }

        let mut conn = conn.acquire().await?;
        let deleted = self
            .schedule_repo
            .delete_exception(&mut *conn, actor.business_id, exception_id)
            .await?;

        if deleted == 0 {
            return Err(AppError::ResourceNotFound("exception".into()));
        }
        Ok(())
    }

    // ---

    async fn assert_staff_in_business(
        &self,
        conn: &mut sqlx::PgConnection,
        actor: &ActorContext,
        staff_id: Uuid,
    ) -> Result<User, AppError> {
        let staff = self
            .catalog_repo
            .find_user(&mut *conn, staff_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("staff".into()))?;

        actor.assert_same_business(staff.business_id)?;
        Ok(staff)
    }
}
