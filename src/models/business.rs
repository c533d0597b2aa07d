// src/models/business.rs

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// 1. Business (o Tenant)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "business_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BusinessType {
    Salon,
    Clinic,
}

impl BusinessType {
    /// Clínicas têm a dimensão extra de salas nos slots.
    pub fn has_rooms(self) -> bool {
        matches!(self, BusinessType::Clinic)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Business {
    pub id: Uuid,
    #[schema(example = "Studio Vila Mariana")]
    pub name: String,
    #[schema(example = "studio-vila-mariana")]
    pub slug: String,
    pub business_type: BusinessType,
    pub phone: Option<String>,
    pub address: Option<String>,
    // Janela padrão do dia; fallback quando a equipe não tem grade própria
    pub work_start: Option<NaiveTime>,
    pub work_end: Option<NaiveTime>,
    #[schema(example = 15)]
    pub slot_step_minutes: i16,
    #[schema(example = "-03:00")]
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. CalendarConfig (configuração tipada, nunca um mapa aberto)
// ---
// A visão "efetiva" do calendário de um estabelecimento, com defaults
// explícitos e o passo já grampeado nos limites do domínio.

pub const DEFAULT_WORK_START: &str = "09:00";
pub const DEFAULT_WORK_END: &str = "18:00";
pub const DEFAULT_UTC_OFFSET: &str = "-03:00";

pub const MIN_STEP_MINUTES: i64 = 5;
pub const MAX_STEP_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy)]
pub struct CalendarConfig {
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub step_minutes: i64,
    pub offset: FixedOffset,
}

impl CalendarConfig {
    pub fn for_business(business: &Business) -> Self {
        let work_start = business
            .work_start
            .unwrap_or_else(|| default_time(DEFAULT_WORK_START));
        let work_end = business
            .work_end
            .unwrap_or_else(|| default_time(DEFAULT_WORK_END));

        let step_minutes =
            (business.slot_step_minutes as i64).clamp(MIN_STEP_MINUTES, MAX_STEP_MINUTES);

        let offset = parse_utc_offset(&business.timezone)
            .unwrap_or_else(|| parse_utc_offset(DEFAULT_UTC_OFFSET).expect("default offset"));

        Self {
            work_start,
            work_end,
            step_minutes,
            offset,
        }
    }

    /// Wall-clock "agora" no fuso do estabelecimento. É a única coisa para a
    /// qual o offset existe: decidir o que já passou e o que é "hoje".
    pub fn now_local(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset).naive_local()
    }
}

fn default_time(raw: &str) -> NaiveTime {
    NaiveTime::parse_from_str(raw, "%H:%M").expect("default work window")
}

/// Interpreta offsets no formato "+04:00" / "-03:30".
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    let (sign, rest) = match raw.chars().next()? {
        '+' => (1, &raw[1..]),
        '-' => (-1, &raw[1..]),
        _ => return None,
    };

    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn business(step: i16, tz: &str) -> Business {
        Business {
            id: Uuid::new_v4(),
            name: "Studio".into(),
            slug: "studio".into(),
            business_type: BusinessType::Salon,
            phone: None,
            address: None,
            work_start: None,
            work_end: None,
            slot_step_minutes: step,
            timezone: tz.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn config_applies_defaults_and_clamps_step() {
        let cfg = CalendarConfig::for_business(&business(120, "-03:00"));
        assert_eq!(cfg.work_start.format("%H:%M").to_string(), "09:00");
        assert_eq!(cfg.work_end.format("%H:%M").to_string(), "18:00");
        assert_eq!(cfg.step_minutes, 60);

        let cfg = CalendarConfig::for_business(&business(1, "-03:00"));
        assert_eq!(cfg.step_minutes, 5);
    }

    #[test]
    fn offset_parsing() {
        assert_eq!(
            parse_utc_offset("+04:00").unwrap().local_minus_utc(),
            4 * 3600
        );
        assert_eq!(
            parse_utc_offset("-03:30").unwrap().local_minus_utc(),
            -(3 * 3600 + 30 * 60)
        );
        assert!(parse_utc_offset("UTC").is_none());
        assert!(parse_utc_offset("+25:00").is_none());
    }

    #[test]
    fn bad_offset_falls_back_to_default() {
        let cfg = CalendarConfig::for_business(&business(15, "America/Sao_Paulo"));
        assert_eq!(cfg.offset.local_minus_utc(), -3 * 3600);
    }
}
