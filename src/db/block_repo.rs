// src/db/block_repo.rs

use chrono::NaiveDateTime;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::block::BookingBlock, models::schedule::TimeRange};

const COLUMNS: &str = "id, business_id, staff_id, starts_at, ends_at, reason, \
                       created_at, updated_at";

#[derive(Clone)]
pub struct BlockRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl BlockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Sobreposição dentro do MESMO escopo (staff específico, ou business-wide
    /// quando staff_id é nulo). Usada na criação: dois bloqueios do mesmo
    /// escopo não podem se cruzar.
    pub async fn scope_overlap_exists<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        staff_id: Option<Uuid>,
        range: &TimeRange,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS( \
                SELECT 1 FROM booking_blocks \
                WHERE business_id = $1 \
                  AND staff_id IS NOT DISTINCT FROM $2 \
                  AND starts_at < $4 AND ends_at > $3)",
        )
        .bind(business_id)
        .bind(staff_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// Há bloqueio valendo para este profissional (próprio ou business-wide)
    /// cruzando [start, end)?
    pub async fn is_blocked<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        staff_id: Uuid,
        range: &TimeRange,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS( \
                SELECT 1 FROM booking_blocks \
                WHERE business_id = $1 \
                  AND (staff_id IS NULL OR staff_id = $2) \
                  AND starts_at < $4 AND ends_at > $3)",
        )
        .bind(business_id)
        .bind(staff_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// Bloqueios aplicáveis a um profissional cruzando a janela; o motor de
    /// disponibilidade carrega uma vez e filtra os candidatos em memória.
    pub async fn applicable_in_window<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        staff_id: Uuid,
        range: &TimeRange,
    ) -> Result<Vec<BookingBlock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let blocks = sqlx::query_as::<_, BookingBlock>(&format!(
            "SELECT {COLUMNS} FROM booking_blocks \
             WHERE business_id = $1 \
               AND (staff_id IS NULL OR staff_id = $2) \
               AND starts_at < $4 AND ends_at > $3 \
             ORDER BY starts_at"
        ))
        .bind(business_id)
        .bind(staff_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(executor)
        .await?;

        Ok(blocks)
    }

    pub async fn list_range<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
        staff_id: Option<Uuid>,
    ) -> Result<Vec<BookingBlock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let blocks = sqlx::query_as::<_, BookingBlock>(&format!(
            "SELECT {COLUMNS} FROM booking_blocks \
             WHERE business_id = $1 \
               AND starts_at < $3 AND ends_at > $2 \
               AND ($4::uuid IS NULL OR staff_id = $4) \
             ORDER BY starts_at"
        ))
        .bind(business_id)
        .bind(from)
        .bind(to)
        .bind(staff_id)
        .fetch_all(executor)
        .await?;

        Ok(blocks)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        staff_id: Option<Uuid>,
        range: &TimeRange,
        reason: Option<&str>,
    ) -> Result<BookingBlock, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let block = sqlx::query_as::<_, BookingBlock>(&format!(
            "INSERT INTO booking_blocks (business_id, staff_id, starts_at, ends_at, reason) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        ))
        .bind(business_id)
        .bind(staff_id)
        .bind(range.start)
        .bind(range.end)
        .bind(reason)
        .fetch_one(executor)
        .await?;

        Ok(block)
    }

    /// Remoção tenant-scoped; apagar um bloqueio não revalida nada que já
    /// exista (sem efeito cascata).
    pub async fn delete<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        block_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM booking_blocks WHERE id = $1 AND business_id = $2")
            .bind(block_id)
            .bind(business_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
