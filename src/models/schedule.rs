// src/models/schedule.rs

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::business::CalendarConfig;

// ---
// 1. TimeRange
// ---
// Todos os intervalos do domínio são semiabertos [start, end): um slot que
// termina exatamente quando outro começa NÃO colide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

// ---
// 2. Grade semanal por membro da equipe
// ---
// Uma linha por dia da semana (0=domingo); ausência de linha = não trabalha
// naquele dia (desde que o profissional tenha alguma grade cadastrada).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WeeklySchedule {
    pub id: Uuid,
    #[schema(ignore)]
    pub business_id: Uuid,
    pub staff_id: Uuid,
    #[schema(example = 1)]
    pub day_of_week: i16,
    pub starts_at: Option<NaiveTime>,
    pub ends_at: Option<NaiveTime>,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 3. Exceção por data
// ---
// Sobrepõe a grade semanal em um dia de calendário. staff_id nulo vale para
// o estabelecimento inteiro (feriado, reforma...).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ScheduleException {
    pub id: Uuid,
    #[schema(ignore)]
    pub business_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub date: NaiveDate,
    pub is_closed: bool,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 4. Janela efetiva de um dia
// ---
// A pausa não parte a janela em duas: ela vira um "bloqueio implícito" que o
// motor e o guard subtraem. Assim a grade de candidatos continua ancorada no
// início da janela.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveWindow {
    pub range: TimeRange,
    pub break_range: Option<TimeRange>,
}

fn day_window(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    break_start: Option<NaiveTime>,
    break_end: Option<NaiveTime>,
) -> EffectiveWindow {
    let start_dt = date.and_time(start);
    let mut end_dt = date.and_time(end);

    // Expediente virando a madrugada: fim "antes" do início rola para o dia
    // seguinte.
    if end_dt <= start_dt {
        end_dt += Duration::days(1);
    }

    let break_range = match (break_start, break_end) {
        (Some(bs), Some(be)) if be > bs => {
            Some(TimeRange::new(date.and_time(bs), date.and_time(be)))
        }
        _ => None,
    };

    EffectiveWindow {
        range: TimeRange::new(start_dt, end_dt),
        break_range,
    }
}

/// Resolve a janela de trabalho de um profissional em uma data.
///
/// Ordem: exceção do profissional > exceção do estabelecimento > linha da
/// grade semanal > (sem grade nenhuma cadastrada) janela padrão do
/// estabelecimento > fechado.
pub fn resolve_window(
    date: NaiveDate,
    staff_exception: Option<&ScheduleException>,
    business_exception: Option<&ScheduleException>,
    weekly: Option<&WeeklySchedule>,
    has_weekly_rows: bool,
    config: &CalendarConfig,
) -> Option<EffectiveWindow> {
    if let Some(exc) = staff_exception.or(business_exception) {
        if exc.is_closed {
            return None;
        }
        let (Some(start), Some(end)) = (exc.start, exc.end) else {
            return None;
        };
        return Some(day_window(date, start, end, exc.break_start, exc.break_end));
    }

    if let Some(row) = weekly {
        if row.is_closed {
            return None;
        }
        let (Some(start), Some(end)) = (row.starts_at, row.ends_at) else {
            return None;
        };
        return Some(day_window(date, start, end, row.break_start, row.break_end));
    }

    if !has_weekly_rows {
        // Profissional sem grade própria herda a janela padrão do negócio.
        return Some(day_window(
            date,
            config.work_start,
            config.work_end,
            None,
            None,
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::business::parse_utc_offset;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn cfg() -> CalendarConfig {
        CalendarConfig {
            work_start: t(9, 0),
            work_end: t(18, 0),
            step_minutes: 15,
            offset: parse_utc_offset("-03:00").unwrap(),
        }
    }

    fn weekly(start: NaiveTime, end: NaiveTime) -> WeeklySchedule {
        WeeklySchedule {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
            day_of_week: 2,
            starts_at: Some(start),
            ends_at: Some(end),
            break_start: None,
            break_end: None,
            is_closed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn exception(staff: Option<Uuid>, closed: bool, win: Option<(NaiveTime, NaiveTime)>) -> ScheduleException {
        ScheduleException {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            staff_id: staff,
            date: date(),
            is_closed: closed,
            start: win.map(|(s, _)| s),
            end: win.map(|(_, e)| e),
            break_start: None,
            break_end: None,
            note: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn half_open_adjacency_is_not_overlap() {
        let a = TimeRange::new(date().and_time(t(9, 0)), date().and_time(t(10, 0)));
        let b = TimeRange::new(date().and_time(t(10, 0)), date().and_time(t(11, 0)));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));

        let c = TimeRange::new(date().and_time(t(9, 59)), date().and_time(t(10, 1)));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn staff_exception_wins_over_everything() {
        let staff_exc = exception(Some(Uuid::new_v4()), false, Some((t(12, 0), t(16, 0))));
        let biz_exc = exception(None, true, None);
        let row = weekly(t(9, 0), t(18, 0));

        let win = resolve_window(date(), Some(&staff_exc), Some(&biz_exc), Some(&row), true, &cfg())
            .unwrap();
        assert_eq!(win.range.start.time(), t(12, 0));
        assert_eq!(win.range.end.time(), t(16, 0));
    }

    #[test]
    fn business_exception_closes_the_day() {
        let biz_exc = exception(None, true, None);
        let row = weekly(t(9, 0), t(18, 0));
        assert!(resolve_window(date(), None, Some(&biz_exc), Some(&row), true, &cfg()).is_none());
    }

    #[test]
    fn weekly_row_is_used_when_no_exception() {
        let row = weekly(t(10, 0), t(14, 0));
        let win = resolve_window(date(), None, None, Some(&row), true, &cfg()).unwrap();
        assert_eq!(win.range.start.time(), t(10, 0));
        assert_eq!(win.range.end.time(), t(14, 0));
    }

    #[test]
    fn missing_weekday_row_means_closed_when_staff_has_a_schedule() {
        assert!(resolve_window(date(), None, None, None, true, &cfg()).is_none());
    }

    #[test]
    fn no_schedule_at_all_falls_back_to_business_window() {
        let win = resolve_window(date(), None, None, None, false, &cfg()).unwrap();
        assert_eq!(win.range.start.time(), t(9, 0));
        assert_eq!(win.range.end.time(), t(18, 0));
    }

    #[test]
    fn break_becomes_an_implicit_block() {
        let mut row = weekly(t(9, 0), t(18, 0));
        row.break_start = Some(t(12, 0));
        row.break_end = Some(t(13, 0));

        let win = resolve_window(date(), None, None, Some(&row), true, &cfg()).unwrap();
        let brk = win.break_range.unwrap();
        assert_eq!(brk.start.time(), t(12, 0));
        assert_eq!(brk.end.time(), t(13, 0));
    }

    #[test]
    fn overnight_window_rolls_to_next_day() {
        let row = weekly(t(22, 0), t(2, 0));
        let win = resolve_window(date(), None, None, Some(&row), true, &cfg()).unwrap();
        assert_eq!(win.range.start, date().and_time(t(22, 0)));
        assert_eq!(win.range.end, date().succ_opt().unwrap().and_time(t(2, 0)));
    }
}
