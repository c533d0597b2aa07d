// src/db/booking_repo.rs

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::booking::{Booking, BookingStatus, BusyInterval},
    models::schedule::TimeRange,
};

const COLUMNS: &str = "id, booking_code, business_id, service_id, staff_id, room_id, \
                       client_name, client_phone, starts_at, ends_at, status, notes, \
                       final_price, currency, phone_verification_code_hash, \
                       phone_verification_expires_at, phone_verified_at, \
                       phone_verification_attempts, created_at, updated_at";

// SQLSTATE da exclusion constraint (bookings_no_overlap): o perdedor de uma
// corrida de inserts cai aqui e recebe o mesmo SlotTaken do caminho sequencial.
const EXCLUSION_VIOLATION: &str = "23P01";

fn map_exclusion(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(EXCLUSION_VIOLATION) {
            return AppError::SlotTaken;
        }
    }
    err.into()
}

pub struct NewBooking<'a> {
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub staff_id: Uuid,
    pub room_id: Option<Uuid>,
    pub client_name: &'a str,
    pub client_phone: &'a str,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub status: BookingStatus,
    pub notes: Option<&'a str>,
    pub booking_code: &'a str,
    pub final_price: Option<Decimal>,
    pub currency: &'a str,
    pub phone_verification_code_hash: Option<&'a str>,
    pub phone_verification_expires_at: Option<NaiveDateTime>,
}

/// Filtros da listagem interna de agendamentos.
#[derive(Debug, Default)]
pub struct BookingFilters {
    pub staff_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub include_unverified: bool,
}

#[derive(Clone)]
pub struct BookingRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CONSULTAS DO MOTOR / GUARD
    // =========================================================================

    /// Existe agendamento não-cancelado deste profissional cruzando [start, end)?
    pub async fn overlap_exists<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        staff_id: Uuid,
        range: &TimeRange,
        ignore_booking_id: Option<Uuid>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS( \
                SELECT 1 FROM bookings \
                WHERE business_id = $1 AND staff_id = $2 \
                  AND status <> 'cancelled' \
                  AND starts_at < $4 AND ends_at > $3 \
                  AND ($5::uuid IS NULL OR id <> $5))",
        )
        .bind(business_id)
        .bind(staff_id)
        .bind(range.start)
        .bind(range.end)
        .bind(ignore_booking_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// Intervalos ocupados do profissional cruzando a janela do dia.
    pub async fn busy_in_window<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        staff_id: Uuid,
        range: &TimeRange,
    ) -> Result<Vec<BusyInterval>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let busy = sqlx::query_as::<_, BusyInterval>(
            "SELECT starts_at, ends_at, room_id FROM bookings \
             WHERE business_id = $1 AND staff_id = $2 \
               AND status <> 'cancelled' \
               AND starts_at < $4 AND ends_at > $3 \
             ORDER BY starts_at",
        )
        .bind(business_id)
        .bind(staff_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(executor)
        .await?;

        Ok(busy)
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        new: NewBooking<'_>,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "INSERT INTO bookings \
                (business_id, service_id, staff_id, room_id, client_name, client_phone, \
                 starts_at, ends_at, status, notes, booking_code, final_price, currency, \
                 phone_verification_code_hash, phone_verification_expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {COLUMNS}"
        ))
        .bind(new.business_id)
        .bind(new.service_id)
        .bind(new.staff_id)
        .bind(new.room_id)
        .bind(new.client_name)
        .bind(new.client_phone)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .bind(new.status)
        .bind(new.notes)
        .bind(new.booking_code)
        .bind(new.final_price)
        .bind(new.currency)
        .bind(new.phone_verification_code_hash)
        .bind(new.phone_verification_expires_at)
        .fetch_one(executor)
        .await
        .map_err(map_exclusion)?;

        Ok(booking)
    }

    pub async fn update_time<'e, E>(
        &self,
        executor: E,
        booking_id: Uuid,
        range: &TimeRange,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "UPDATE bookings SET starts_at = $2, ends_at = $3, updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        ))
        .bind(booking_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(executor)
        .await
        .map_err(map_exclusion)?;

        Ok(booking)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "UPDATE bookings SET status = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        ))
        .bind(booking_id)
        .bind(status)
        .fetch_one(executor)
        .await?;

        Ok(booking)
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn find_in_business<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        booking_id: Uuid,
    ) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {COLUMNS} FROM bookings WHERE id = $1 AND business_id = $2"
        ))
        .bind(booking_id)
        .bind(business_id)
        .fetch_optional(executor)
        .await?;

        Ok(booking)
    }

    pub async fn find_by_code<'e, E>(
        &self,
        executor: E,
        booking_code: &str,
    ) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {COLUMNS} FROM bookings WHERE booking_code = $1"
        ))
        .bind(booking_code)
        .fetch_optional(executor)
        .await?;

        Ok(booking)
    }

    pub async fn code_exists<'e, E>(&self, executor: E, code: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM bookings WHERE booking_code = $1)")
                .bind(code)
                .fetch_one(executor)
                .await?;

        Ok(exists)
    }

    /// Listagem interna. Agendamentos públicos ainda não verificados ficam de
    /// fora por padrão (hash presente e verified_at nulo).
    pub async fn list<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        filters: &BookingFilters,
    ) -> Result<Vec<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {COLUMNS} FROM bookings \
             WHERE business_id = $1 \
               AND ($2::uuid IS NULL OR staff_id = $2) \
               AND ($3::booking_status IS NULL OR status = $3) \
               AND ($4::date IS NULL OR starts_at::date = $4) \
               AND ($5::timestamp IS NULL OR starts_at >= $5) \
               AND ($6::timestamp IS NULL OR starts_at < $6) \
               AND ($7::bool OR phone_verification_code_hash IS NULL OR phone_verified_at IS NOT NULL) \
             ORDER BY starts_at DESC"
        ))
        .bind(business_id)
        .bind(filters.staff_id)
        .bind(filters.status)
        .bind(filters.date)
        .bind(filters.from)
        .bind(filters.to)
        .bind(filters.include_unverified)
        .fetch_all(executor)
        .await?;

        Ok(bookings)
    }

    // =========================================================================
    //  VERIFICAÇÃO POR TELEFONE
    // =========================================================================

    /// Conta a tentativa ANTES da checagem do código — errar também consome.
    pub async fn increment_verification_attempts<'e, E>(
        &self,
        executor: E,
        booking_id: Uuid,
    ) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let attempts = sqlx::query_scalar::<_, i32>(
            "UPDATE bookings \
             SET phone_verification_attempts = phone_verification_attempts + 1, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING phone_verification_attempts",
        )
        .bind(booking_id)
        .fetch_one(executor)
        .await?;

        Ok(attempts)
    }

    pub async fn mark_phone_verified<'e, E>(
        &self,
        executor: E,
        booking_id: Uuid,
        verified_at: NaiveDateTime,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "UPDATE bookings \
             SET phone_verified_at = $2, \
                 phone_verification_code_hash = NULL, \
                 phone_verification_expires_at = NULL, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        ))
        .bind(booking_id)
        .bind(verified_at)
        .fetch_one(executor)
        .await?;

        Ok(booking)
    }
}
