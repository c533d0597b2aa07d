// src/models/block.rs

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::timefmt::wire_dt;

/// Intervalo fechado ad-hoc (pausa, folga, manutenção), independente da
/// grade semanal. staff_id nulo bloqueia todos os profissionais.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookingBlock {
    pub id: Uuid,
    #[schema(ignore)]
    pub business_id: Uuid,
    pub staff_id: Option<Uuid>,
    #[serde(with = "wire_dt")]
    #[schema(example = "2026-03-10 12:00:00", value_type = String)]
    pub starts_at: NaiveDateTime,
    #[serde(with = "wire_dt")]
    #[schema(example = "2026-03-10 13:00:00", value_type = String)]
    pub ends_at: NaiveDateTime,
    #[schema(example = "Almoço")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Bloqueios não podem cobrir mais que isso de uma vez.
pub const MAX_BLOCK_SPAN_DAYS: i64 = 14;
