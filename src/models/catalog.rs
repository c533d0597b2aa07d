// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// 1. Papéis de usuário
// ---
// Enum fechado com checagens de capacidade explícitas por ação — nada de
// checagem "duck-typed" espalhada pelos handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Owner,
    Manager,
    Staff,
    SuperAdmin,
}

impl UserRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "owner" => Some(UserRole::Owner),
            "manager" => Some(UserRole::Manager),
            "staff" => Some(UserRole::Staff),
            "super_admin" => Some(UserRole::SuperAdmin),
            _ => None,
        }
    }

    pub fn is_super_admin(self) -> bool {
        matches!(self, UserRole::SuperAdmin)
    }

    /// Quem pode receber agendamentos (aparece na agenda pública).
    pub fn is_bookable(self) -> bool {
        matches!(self, UserRole::Owner | UserRole::Manager | UserRole::Staff)
    }

    /// Quem administra grade de horários, exceções e bloqueios.
    pub fn can_manage_schedule(self) -> bool {
        matches!(
            self,
            UserRole::Owner | UserRole::Manager | UserRole::SuperAdmin
        )
    }

    /// `staff` só agenda/mexe na própria agenda; gestores agendam para todos.
    pub fn can_act_for_staff(self, actor_id: Uuid, staff_id: Uuid) -> bool {
        match self {
            UserRole::Staff => actor_id == staff_id,
            _ => true,
        }
    }
}

// ---
// 2. User (membro da equipe)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    #[schema(ignore)]
    pub business_id: Uuid,
    #[schema(example = "Marina Duarte")]
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 3. Service
// ---
// A duração é imutável por agendamento: ends_at é derivado dela na criação
// e congelado junto com o preço (snapshot).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Service {
    pub id: Uuid,
    #[schema(ignore)]
    pub business_id: Uuid,
    #[schema(example = "Corte e finalização")]
    pub name: String,
    #[schema(example = 60)]
    pub duration_minutes: i32,
    #[schema(example = "90.00")]
    pub price: Decimal,
    #[schema(example = "BRL")]
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const MIN_SERVICE_DURATION: i64 = 5;
pub const MAX_SERVICE_DURATION: i64 = 600;

impl Service {
    pub fn duration_in_bounds(&self) -> bool {
        let d = self.duration_minutes as i64;
        (MIN_SERVICE_DURATION..=MAX_SERVICE_DURATION).contains(&d)
    }
}

// ---
// 4. Room (clínicas)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Room {
    pub id: Uuid,
    #[schema(ignore)]
    pub business_id: Uuid,
    #[schema(example = "Consultório 2")]
    pub name: String,
    pub room_type: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_acts_only_for_self() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert!(UserRole::Staff.can_act_for_staff(me, me));
        assert!(!UserRole::Staff.can_act_for_staff(me, other));
        assert!(UserRole::Manager.can_act_for_staff(me, other));
        assert!(UserRole::Owner.can_act_for_staff(me, other));
    }

    #[test]
    fn schedule_management_is_for_managers() {
        assert!(UserRole::Owner.can_manage_schedule());
        assert!(UserRole::Manager.can_manage_schedule());
        assert!(!UserRole::Staff.can_manage_schedule());
    }

    #[test]
    fn role_parsing_is_closed() {
        assert_eq!(UserRole::parse("owner"), Some(UserRole::Owner));
        assert_eq!(UserRole::parse("super_admin"), Some(UserRole::SuperAdmin));
        assert_eq!(UserRole::parse("root"), None);
    }
}
