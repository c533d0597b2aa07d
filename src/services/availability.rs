// src/services/availability.rs

// Motor de disponibilidade: combina config do estabelecimento + janela
// efetiva do profissional + agendamentos existentes + bloqueios e devolve os
// intervalos ainda agendáveis. Leitura pura, sem efeitos colaterais — pode
// rodar com qualquer concorrência; quem garante a consistência na escrita é
// o ConflictGuard dentro da transação.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::{Acquire, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    common::timefmt::wire_dt,
    db::{BlockRepository, BookingRepository, BusinessRepository, CatalogRepository},
    models::{
        booking::BusyInterval,
        business::CalendarConfig,
        catalog::{Room, User},
        schedule::{EffectiveWindow, TimeRange},
    },
    services::schedule::ScheduleService,
};

/// Antecedência mínima para agendar "hoje": candidatos começando a menos de
/// 5 minutos de agora são descartados.
const LEAD_TIME_MINUTES: i64 = 5;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlotRoom {
    pub id: Uuid,
    #[schema(example = "Consultório 2")]
    pub name: String,
    pub room_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Slot {
    #[serde(with = "wire_dt")]
    #[schema(example = "2026-03-10 09:30:00", value_type = String)]
    pub starts_at: NaiveDateTime,
    #[serde(with = "wire_dt")]
    #[schema(example = "2026-03-10 10:30:00", value_type = String)]
    pub ends_at: NaiveDateTime,
    /// Só em clínicas: salas ainda livres no intervalo. Informativo — não
    /// remove o slot, a sala não é restrição dura na listagem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_rooms: Option<Vec<SlotRoom>>,
}

#[derive(Clone)]
pub struct AvailabilityService {
    business_repo: BusinessRepository,
    catalog_repo: CatalogRepository,
    booking_repo: BookingRepository,
    block_repo: BlockRepository,
    schedule_service: ScheduleService,
}

impl AvailabilityService {
    pub fn new(
        business_repo: BusinessRepository,
        catalog_repo: CatalogRepository,
        booking_repo: BookingRepository,
        block_repo: BlockRepository,
        schedule_service: ScheduleService,
    ) -> Self {
        Self {
            business_repo,
            catalog_repo,
            booking_repo,
            block_repo,
            schedule_service,
        }
    }

    /// Profissional padrão quando o cliente não escolhe um: o primeiro
    /// agendável ativo do estabelecimento.
    pub async fn default_staff<'a, A>(
        &self,
        conn: A,
        business_id: Uuid,
    ) -> Result<Option<User>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.catalog_repo.first_bookable_staff(&mut *conn, business_id).await
    }

    /// Slots agendáveis de (profissional, serviço, data).
    ///
    /// Caminho de leitura permissivo: serviço/profissional inexistente, de
    /// outro tenant ou inativo, e duração fora de [5, 600] devolvem lista
    /// vazia — "sem horários" e "entrada inválida" são indistinguíveis aqui.
    pub async fn slots_for_day<'a, A>(
        &self,
        conn: A,
        business_id: Uuid,
        staff_id: Uuid,
        service_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let Some(service) = self.catalog_repo.find_service(&mut *conn, service_id).await? else {
            return Ok(Vec::new());
        };
        if service.business_id != business_id || !service.duration_in_bounds() {
            return Ok(Vec::new());
        }

        let Some(business) = self.business_repo.find_by_id(&mut *conn, business_id).await? else {
            return Ok(Vec::new());
        };

        let Some(staff) = self.catalog_repo.find_user(&mut *conn, staff_id).await? else {
            return Ok(Vec::new());
        };
        if staff.business_id != business_id || !staff.is_active || !staff.role.is_bookable() {
            return Ok(Vec::new());
        }

        let Some(window) = self
            .schedule_service
            .effective_window(&mut *conn, &business, staff_id, date)
            .await?
        else {
            return Ok(Vec::new());
        };

        let config = CalendarConfig::for_business(&business);
        let now_local = config.now_local();

        let busy = self
            .booking_repo
            .busy_in_window(&mut *conn, business_id, staff_id, &window.range)
            .await?;
        let blocks = self
            .block_repo
            .applicable_in_window(&mut *conn, business_id, staff_id, &window.range)
            .await?;

        let busy_ranges: Vec<TimeRange> = busy
            .iter()
            .map(|b| TimeRange::new(b.starts_at, b.ends_at))
            .collect();
        let block_ranges: Vec<TimeRange> = blocks
            .iter()
            .map(|b| TimeRange::new(b.starts_at, b.ends_at))
            .collect();

        let candidates = compute_candidates(
            &window,
            config.step_minutes,
            service.duration_minutes as i64,
            now_local,
            &busy_ranges,
            &block_ranges,
        );

        let rooms = if business.business_type.has_rooms() {
            self.catalog_repo.list_active_rooms(&mut *conn, business_id).await?
        } else {
            Vec::new()
        };

        let slots = candidates
            .into_iter()
            .map(|candidate| Slot {
                starts_at: candidate.start,
                ends_at: candidate.end,
                available_rooms: if business.business_type.has_rooms() {
                    Some(free_rooms(&rooms, &busy, &candidate))
                } else {
                    None
                },
            })
            .collect();

        Ok(slots)
    }
}

// ── Núcleo puro ──────────────────────────────────────────────────────────

/// Gera a grade de candidatos e filtra colisões. Candidatos são alinhados ao
/// passo A PARTIR DO INÍCIO DA JANELA (não da meia-noite); o último início
/// válido é windowEnd - duração. Comparações sempre semiabertas [start, end).
pub(crate) fn compute_candidates(
    window: &EffectiveWindow,
    step_minutes: i64,
    duration_minutes: i64,
    now_local: NaiveDateTime,
    busy: &[TimeRange],
    blocks: &[TimeRange],
) -> Vec<TimeRange> {
    let step = Duration::minutes(step_minutes);
    let duration = Duration::minutes(duration_minutes);

    // Janela já inteiramente no passado
    if window.range.end < now_local {
        return Vec::new();
    }

    let last_start = window.range.end - duration;
    if last_start < window.range.start {
        return Vec::new();
    }

    let is_today = window.range.start.date() == now_local.date();
    let lead_cutoff = now_local + Duration::minutes(LEAD_TIME_MINUTES);

    // A pausa da janela entra como bloqueio implícito
    let mut blocked: Vec<TimeRange> = blocks.to_vec();
    if let Some(break_range) = window.break_range {
        blocked.push(break_range);
    }

    let mut slots = Vec::new();
    let mut t = window.range.start;
    while t <= last_start {
        let candidate = TimeRange::new(t, t + duration);
        t += step;

        if is_today && candidate.start <= lead_cutoff {
            continue;
        }
        if busy.iter().any(|b| b.overlaps(&candidate)) {
            continue;
        }
        if blocked.iter().any(|b| b.overlaps(&candidate)) {
            continue;
        }
        slots.push(candidate);
    }

    slots
}

/// Salas não ocupadas por outro agendamento no intervalo do slot.
pub(crate) fn free_rooms(rooms: &[Room], busy: &[BusyInterval], slot: &TimeRange) -> Vec<SlotRoom> {
    let busy_room_ids: Vec<Uuid> = busy
        .iter()
        .filter(|b| TimeRange::new(b.starts_at, b.ends_at).overlaps(slot))
        .filter_map(|b| b.room_id)
        .collect();

    rooms
        .iter()
        .filter(|room| !busy_room_ids.contains(&room.id))
        .map(|room| SlotRoom {
            id: room.id,
            name: room.name.clone(),
            room_type: room.room_type.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn dt(day: u32, h: u32, m: u32) -> NaiveDateTime {
        d(day).and_time(t(h, m))
    }

    fn window(day: u32, start: (u32, u32), end: (u32, u32)) -> EffectiveWindow {
        EffectiveWindow {
            range: TimeRange::new(dt(day, start.0, start.1), dt(day, end.0, end.1)),
            break_range: None,
        }
    }

    // "ontem à noite": um agora que nunca interfere com os cenários do dia 10
    fn now_far_before() -> NaiveDateTime {
        dt(9, 20, 0)
    }

    #[test]
    fn empty_day_yields_full_grid() {
        // 09:00–18:00, passo 15, duração 60 -> 09:00, 09:15, ..., 17:00
        // (último início é windowEnd - duração = 17:00; 33 inícios no total)
        let slots = compute_candidates(&window(10, (9, 0), (18, 0)), 15, 60, now_far_before(), &[], &[]);
        assert_eq!(slots.len(), 33);
        assert_eq!(slots[0].start, dt(10, 9, 0));
        assert_eq!(slots[0].end, dt(10, 10, 0));
        assert_eq!(slots.last().unwrap().start, dt(10, 17, 0));
        assert_eq!(slots.last().unwrap().end, dt(10, 18, 0));
    }

    #[test]
    fn slots_are_ascending_and_step_aligned_from_window_start() {
        // Janela começando fora da grade da meia-noite: 09:10
        let slots = compute_candidates(&window(10, (9, 10), (10, 10)), 15, 30, now_far_before(), &[], &[]);
        let starts: Vec<_> = slots.iter().map(|s| s.start.time()).collect();
        assert_eq!(starts, vec![t(9, 10), t(9, 25), t(9, 40)]);
    }

    #[test]
    fn existing_booking_removes_colliding_candidates() {
        // Agendamento 10:00–11:00, passo 15, duração 15: 09:00–09:45 seguem
        // válidos (terminam até 10:00), 10:00–10:45 caem, retoma às 11:00.
        let busy = vec![TimeRange::new(dt(10, 10, 0), dt(10, 11, 0))];
        let slots = compute_candidates(&window(10, (9, 0), (18, 0)), 15, 15, now_far_before(), &busy, &[]);
        let starts: Vec<_> = slots.iter().map(|s| s.start.time()).collect();

        assert!(starts.contains(&t(9, 0)));
        assert!(starts.contains(&t(9, 45)));
        assert!(!starts.contains(&t(10, 0)));
        assert!(!starts.contains(&t(10, 15)));
        assert!(!starts.contains(&t(10, 30)));
        assert!(!starts.contains(&t(10, 45)));
        assert!(starts.contains(&t(11, 0)));
    }

    #[test]
    fn slot_ending_when_booking_starts_is_not_a_collision() {
        let busy = vec![TimeRange::new(dt(10, 10, 0), dt(10, 11, 0))];
        let slots = compute_candidates(&window(10, (9, 0), (18, 0)), 30, 60, now_far_before(), &busy, &[]);
        let starts: Vec<_> = slots.iter().map(|s| s.start.time()).collect();

        // 09:00–10:00 encosta no agendamento e é válido; 11:00 retoma
        assert!(starts.contains(&t(9, 0)));
        assert!(!starts.contains(&t(9, 30)));
        assert!(!starts.contains(&t(10, 0)));
        assert!(!starts.contains(&t(10, 30)));
        assert!(starts.contains(&t(11, 0)));
    }

    #[test]
    fn block_removes_intersecting_candidates() {
        // Bloqueio 12:00–13:00 remove todo candidato que cruza o intervalo
        let blocks = vec![TimeRange::new(dt(10, 12, 0), dt(10, 13, 0))];
        let slots = compute_candidates(&window(10, (9, 0), (18, 0)), 15, 60, now_far_before(), &[], &blocks);
        let starts: Vec<_> = slots.iter().map(|s| s.start.time()).collect();

        assert!(starts.contains(&t(11, 0)));
        assert!(!starts.contains(&t(11, 15)));
        assert!(!starts.contains(&t(12, 45)));
        assert!(starts.contains(&t(13, 0)));
    }

    #[test]
    fn break_behaves_exactly_like_a_block() {
        let mut with_break = window(10, (9, 0), (18, 0));
        with_break.break_range = Some(TimeRange::new(dt(10, 12, 0), dt(10, 13, 0)));

        let blocks = vec![TimeRange::new(dt(10, 12, 0), dt(10, 13, 0))];
        let via_break =
            compute_candidates(&with_break, 15, 60, now_far_before(), &[], &[]);
        let via_block =
            compute_candidates(&window(10, (9, 0), (18, 0)), 15, 60, now_far_before(), &[], &blocks);

        assert_eq!(via_break, via_block);
    }

    #[test]
    fn today_discards_candidates_within_lead_time() {
        // Agora = 10:02 do próprio dia: candidatos com início <= 10:07 caem
        let now = dt(10, 10, 2);
        let slots = compute_candidates(&window(10, (9, 0), (18, 0)), 15, 60, now, &[], &[]);
        let starts: Vec<_> = slots.iter().map(|s| s.start.time()).collect();

        assert!(!starts.contains(&t(9, 0)));
        assert!(!starts.contains(&t(10, 0)));
        assert_eq!(starts.first(), Some(&t(10, 15)));
    }

    #[test]
    fn window_entirely_in_the_past_is_empty() {
        let now = dt(11, 8, 0); // dia seguinte
        let slots = compute_candidates(&window(10, (9, 0), (18, 0)), 15, 60, now, &[], &[]);
        assert!(slots.is_empty());
    }

    #[test]
    fn window_too_short_for_duration_is_empty() {
        let slots = compute_candidates(&window(10, (9, 0), (9, 30)), 15, 60, now_far_before(), &[], &[]);
        assert!(slots.is_empty());
    }

    #[test]
    fn overnight_window_generates_past_midnight() {
        let win = EffectiveWindow {
            range: TimeRange::new(dt(10, 22, 0), dt(11, 2, 0)),
            break_range: None,
        };
        let slots = compute_candidates(&win, 60, 60, now_far_before(), &[], &[]);
        let starts: Vec<_> = slots.iter().map(|s| s.start).collect();

        assert_eq!(starts.first(), Some(&dt(10, 22, 0)));
        assert_eq!(starts.last(), Some(&dt(11, 1, 0)));
    }

    #[test]
    fn free_rooms_excludes_occupied_ones() {
        let room_a = room("Sala A");
        let room_b = room("Sala B");
        let busy = vec![BusyInterval {
            starts_at: dt(10, 10, 0),
            ends_at: dt(10, 11, 0),
            room_id: Some(room_a.id),
        }];

        let slot = TimeRange::new(dt(10, 10, 0), dt(10, 11, 0));
        let free = free_rooms(&[room_a.clone(), room_b.clone()], &busy, &slot);
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].id, room_b.id);

        // Em outro horário as duas salas voltam
        let later = TimeRange::new(dt(10, 14, 0), dt(10, 15, 0));
        let free = free_rooms(&[room_a, room_b], &busy, &later);
        assert_eq!(free.len(), 2);
    }

    fn room(name: &str) -> Room {
        Room {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            name: name.into(),
            room_type: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
