// src/models/booking.rs

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::timefmt::{wire_dt, wire_dt_opt};

// ---
// 1. Status e máquina de estados
// ---
// pending -> confirmed -> done; {pending, confirmed} -> cancelled.
// done e cancelled são terminais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Done,
    Cancelled,
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Done | BookingStatus::Cancelled)
    }

    /// Ocupa o intervalo do profissional? (invariante de não-sobreposição
    /// vale para todo status exceto cancelled)
    pub fn occupies_slot(self) -> bool {
        self != BookingStatus::Cancelled
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Done) | (Pending, Cancelled) | (Confirmed, Cancelled)
        )
    }
}

// ---
// 2. Booking
// ---
// starts_at/ends_at são wall-clock local do estabelecimento. ends_at é sempre
// starts_at + duração do serviço NO MOMENTO da criação — mudar o serviço
// depois não mexe em agendamentos existentes (snapshot, como final_price).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    #[schema(example = "BK-7Q2MX9AD")]
    pub booking_code: Option<String>,
    #[schema(ignore)]
    pub business_id: Uuid,
    pub service_id: Uuid,
    pub staff_id: Uuid,
    pub room_id: Option<Uuid>,
    #[schema(example = "Ana Paula")]
    pub client_name: String,
    #[schema(example = "+5511999998888")]
    pub client_phone: String,
    #[serde(with = "wire_dt")]
    #[schema(example = "2026-03-10 09:30:00", value_type = String)]
    pub starts_at: NaiveDateTime,
    #[serde(with = "wire_dt")]
    #[schema(example = "2026-03-10 10:30:00", value_type = String)]
    pub ends_at: NaiveDateTime,
    pub status: BookingStatus,
    pub notes: Option<String>,
    #[schema(example = "90.00")]
    pub final_price: Option<Decimal>,
    #[schema(example = "BRL")]
    pub currency: String,

    // Verificação por telefone (fluxo público). O hash nunca sai na API.
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub phone_verification_code_hash: Option<String>,
    #[serde(with = "wire_dt_opt")]
    #[schema(value_type = Option<String>)]
    pub phone_verification_expires_at: Option<NaiveDateTime>,
    #[serde(with = "wire_dt_opt")]
    #[schema(value_type = Option<String>)]
    pub phone_verified_at: Option<NaiveDateTime>,
    #[schema(ignore)]
    pub phone_verification_attempts: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Agendamento público ainda escondido das listagens da equipe.
    pub fn is_pending_phone_verification(&self) -> bool {
        self.phone_verification_code_hash.is_some() && self.phone_verified_at.is_none()
    }
}

// Intervalo ocupado carregado para o motor de disponibilidade (só o que o
// filtro precisa, com a sala para a anotação de clínicas).
#[derive(Debug, Clone, FromRow)]
pub struct BusyInterval {
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub room_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingStatus::*;

    #[test]
    fn transition_matrix() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Done));
        assert!(Confirmed.can_transition_to(Cancelled));

        // done só a partir de confirmed
        assert!(!Pending.can_transition_to(Done));
        // terminais não saem
        assert!(!Done.can_transition_to(Cancelled));
        assert!(!Done.can_transition_to(Confirmed));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        // sem regressão
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn cancelled_frees_the_slot() {
        assert!(Pending.occupies_slot());
        assert!(Confirmed.occupies_slot());
        assert!(Done.occupies_slot());
        assert!(!Cancelled.occupies_slot());
    }

    #[test]
    fn terminal_statuses() {
        assert!(Done.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!Confirmed.is_terminal());
    }
}
