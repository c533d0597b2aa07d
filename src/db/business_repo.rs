// src/db/business_repo.rs

use chrono::NaiveTime;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::business::Business};

const COLUMNS: &str = "id, name, slug, business_type, phone, address, \
                       work_start, work_end, slot_step_minutes, timezone, \
                       created_at, updated_at";

#[derive(Clone)]
pub struct BusinessRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl BusinessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
    ) -> Result<Option<Business>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let business = sqlx::query_as::<_, Business>(&format!(
            "SELECT {COLUMNS} FROM businesses WHERE id = $1"
        ))
        .bind(business_id)
        .fetch_optional(executor)
        .await?;

        Ok(business)
    }

    pub async fn find_by_slug<'e, E>(
        &self,
        executor: E,
        slug: &str,
    ) -> Result<Option<Business>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let business = sqlx::query_as::<_, Business>(&format!(
            "SELECT {COLUMNS} FROM businesses WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(executor)
        .await?;

        Ok(business)
    }

    /// Atualização parcial da configuração de calendário; campos ausentes
    /// ficam como estão.
    pub async fn update_calendar_settings<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        work_start: Option<NaiveTime>,
        work_end: Option<NaiveTime>,
        slot_step_minutes: Option<i16>,
        timezone: Option<&str>,
    ) -> Result<Business, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let business = sqlx::query_as::<_, Business>(&format!(
            "UPDATE businesses SET \
                work_start = COALESCE($2, work_start), \
                work_end = COALESCE($3, work_end), \
                slot_step_minutes = COALESCE($4, slot_step_minutes), \
                timezone = COALESCE($5, timezone), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        ))
        .bind(business_id)
        .bind(work_start)
        .bind(work_end)
        .bind(slot_step_minutes)
        .bind(timezone)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("business".into()))?;

        Ok(business)
    }
}
