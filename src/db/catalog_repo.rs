// src/db/catalog_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{Room, Service, User},
};

const SERVICE_COLUMNS: &str = "id, business_id, name, duration_minutes, price, currency, \
                               is_active, created_at, updated_at";
const USER_COLUMNS: &str = "id, business_id, name, phone, role, is_active, created_at, updated_at";
const ROOM_COLUMNS: &str = "id, business_id, name, room_type, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct CatalogRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  SERVIÇOS
    // =========================================================================

    pub async fn find_service<'e, E>(
        &self,
        executor: E,
        service_id: Uuid,
    ) -> Result<Option<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
        ))
        .bind(service_id)
        .fetch_optional(executor)
        .await?;

        Ok(service)
    }

    pub async fn list_services<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        only_active: bool,
    ) -> Result<Vec<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let services = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services \
             WHERE business_id = $1 AND (NOT $2::bool OR is_active) \
             ORDER BY created_at"
        ))
        .bind(business_id)
        .bind(only_active)
        .fetch_all(executor)
        .await?;

        Ok(services)
    }

    pub async fn create_service<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        name: &str,
        duration_minutes: i32,
        price: Decimal,
        currency: &str,
    ) -> Result<Service, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>(&format!(
            "INSERT INTO services (business_id, name, duration_minutes, price, currency) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {SERVICE_COLUMNS}"
        ))
        .bind(business_id)
        .bind(name)
        .bind(duration_minutes)
        .bind(price)
        .bind(currency)
        .fetch_one(executor)
        .await?;

        Ok(service)
    }

    // =========================================================================
    //  EQUIPE
    // =========================================================================

    pub async fn find_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Equipe agendável: papéis owner/manager/staff, ativos.
    pub async fn list_bookable_staff<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
    ) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let staff = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE business_id = $1 \
               AND role IN ('owner', 'manager', 'staff') \
               AND is_active \
             ORDER BY created_at"
        ))
        .bind(business_id)
        .fetch_all(executor)
        .await?;

        Ok(staff)
    }

    /// Escolha padrão quando o cliente público não indica profissional.
    pub async fn first_bookable_staff<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let staff = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE business_id = $1 \
               AND role IN ('owner', 'manager', 'staff') \
               AND is_active \
             ORDER BY created_at \
             LIMIT 1"
        ))
        .bind(business_id)
        .fetch_optional(executor)
        .await?;

        Ok(staff)
    }

    // =========================================================================
    //  SALAS (clínicas)
    // =========================================================================

    pub async fn list_active_rooms<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
    ) -> Result<Vec<Room>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rooms = sqlx::query_as::<_, Room>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms \
             WHERE business_id = $1 AND is_active \
             ORDER BY name"
        ))
        .bind(business_id)
        .fetch_all(executor)
        .await?;

        Ok(rooms)
    }

    pub async fn find_room<'e, E>(
        &self,
        executor: E,
        business_id: Uuid,
        room_id: Uuid,
    ) -> Result<Option<Room>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room = sqlx::query_as::<_, Room>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1 AND business_id = $2"
        ))
        .bind(room_id)
        .bind(business_id)
        .fetch_optional(executor)
        .await?;

        Ok(room)
    }
}
