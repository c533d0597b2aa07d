// src/db/schedule_repo.rs

use chrono::{NaiveDate, NaiveTime};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::schedule::{ScheduleException, WeeklySchedule},
};

const WEEKLY_COLUMNS: &str = "id, business_id, staff_id, day_of_week, starts_at, ends_at, \
                              break_start, break_end, is_closed, created_at, updated_at";
const EXCEPTION_COLUMNS: &str = "id, business_id, staff_id, date, is_closed, start, \"end\", \
                                 break_start, break_end, note, created_at, updated_at";

#[derive(Clone)]
pub struct ScheduleRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl ScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  GRADE SEMANAL
    // =========================================================================

    pub async fn weekly_for_staff<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
    ) -> Result<Vec<WeeklySchedule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, WeeklySchedule>(&format!(
            "SELECT {WEEKLY_COLUMNS} FROM staff_work_schedules \
             WHERE staff_id = $1 ORDER BY day_of_week"
        ))
        .bind(staff_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn weekly_for_day<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
        day_of_week: i16,
    ) -> Result<Option<WeeklySchedule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, WeeklySchedule>(&format!(
            "SELECT {WEEKLY_COLUMNS} FROM staff_work_schedules \
             WHERE staff_id = $1 AND day_of_week = $2"
        ))
        .bind(staff_id)
        .bind(day_of_week)
        .fetch_optional(executor)
        .await?;

        Ok(row)
    }

    pub async fn has_weekly_rows<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM staff_work_schedules WHERE staff_id = $1)",
        )
        .bind(staff_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    pub async fn delete_weekly_for_staff<'e, E>(
        &self,
        executor: E,
        staff_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM staff_work_schedules WHERE staff_id = $1")
            .bind(staff_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_weekly_row<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        staff_id: Uuid,
        day_of_week: i16,
        starts_at: Option<NaiveTime>,
        ends_at: Option<NaiveTime>,
        break_start: Option<NaiveTime>,
        break_end: Option<NaiveTime>,
        is_closed: bool,
    ) -> Result<WeeklySchedule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, WeeklySchedule>(&format!(
            "INSERT INTO staff_work_schedules \
                (business_id, staff_id, day_of_week, starts_at, ends_at, \
                 break_start, break_end, is_closed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {WEEKLY_COLUMNS}"
        ))
        .bind(business_id)
        .bind(staff_id)
        .bind(day_of_week)
        .bind(starts_at)
        .bind(ends_at)
        .bind(break_start)
        .bind(break_end)
        .bind(is_closed)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    // =========================================================================
    //  EXCEÇÕES POR DATA
    // =========================================================================

    /// Exceção para um escopo exato: staff específico ou (staff_id nulo)
    /// estabelecimento inteiro.
    pub async fn find_exception<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        staff_id: Option<Uuid>,
        date: NaiveDate,
    ) -> Result<Option<ScheduleException>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exception = sqlx::query_as::<_, ScheduleException>(&format!(
            "SELECT {EXCEPTION_COLUMNS} FROM schedule_exceptions \
             WHERE business_id = $1 AND staff_id IS NOT DISTINCT FROM $2 AND date = $3"
        ))
        .bind(business_id)
        .bind(staff_id)
        .bind(date)
        .fetch_optional(executor)
        .await?;

        Ok(exception)
    }

    pub async fn list_exceptions<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
    ) -> Result<Vec<ScheduleException>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exceptions = sqlx::query_as::<_, ScheduleException>(&format!(
            "SELECT {EXCEPTION_COLUMNS} FROM schedule_exceptions \
             WHERE business_id = $1 ORDER BY date DESC"
        ))
        .bind(business_id)
        .fetch_all(executor)
        .await?;

        Ok(exceptions)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_exception<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        staff_id: Option<Uuid>,
        date: NaiveDate,
        is_closed: bool,
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
        break_start: Option<NaiveTime>,
        break_end: Option<NaiveTime>,
        note: Option<&str>,
    ) -> Result<ScheduleException, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exception = sqlx::query_as::<_, ScheduleException>(&format!(
            "INSERT INTO schedule_exceptions \
                (business_id, staff_id, date, is_closed, start, \"end\", \
                 break_start, break_end, note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (business_id, staff_id, date) DO UPDATE SET \
                is_closed = EXCLUDED.is_closed, \
                start = EXCLUDED.start, \
                \"end\" = EXCLUDED.\"end\", \
                break_start = EXCLUDED.break_start, \
                break_end = EXCLUDED.break_end, \
                note = EXCLUDED.note, \
                updated_at = now() \
             RETURNING {EXCEPTION_COLUMNS}"
        ))
        .bind(business_id)
        .bind(staff_id)
        .bind(date)
        .bind(is_closed)
        .bind(start)
        .bind(end)
        .bind(break_start)
        .bind(break_end)
        .bind(note)
        .fetch_one(executor)
        .await?;

        Ok(exception)
    }

    pub async fn delete_exception<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        exception_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM schedule_exceptions WHERE id = $1 AND business_id = $2",
        )
        .bind(exception_id)
        .bind(business_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
