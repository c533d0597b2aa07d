// src/services/public_booking.rs

// Fluxo público (cliente anônimo): o horário pedido é validado contra a
// lista de slots RE-DERIVADA no servidor — nunca confiamos no que a tela do
// cliente mostrou. O agendamento nasce pending com um OTP de 4 dígitos
// (hash bcrypt, 10 minutos de validade) e fica invisível para a equipe até
// o telefone ser verificado.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use rand::Rng;
use sqlx::{Acquire, Connection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        BookingRepository, BusinessRepository, CatalogRepository,
        booking_repo::NewBooking,
    },
    models::{
        booking::{Booking, BookingStatus},
        business::{Business, CalendarConfig},
        catalog::{Service, User},
        schedule::TimeRange,
    },
    services::{
        availability::{AvailabilityService, Slot},
        booking::random_booking_code,
        conflict::ConflictGuard,
        notify::NotificationSink,
    },
};

const OTP_TTL_MINUTES: i64 = 10;
const MAX_OTP_ATTEMPTS: i32 = 5;

#[derive(Debug, Clone)]
pub struct PublicBookingInput {
    pub service_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub starts_at: NaiveDateTime,
    pub client_name: String,
    pub client_phone: String,
    pub notes: Option<String>,
    pub room_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct PublicBookingService {
    business_repo: BusinessRepository,
    catalog_repo: CatalogRepository,
    booking_repo: BookingRepository,
    availability: AvailabilityService,
    guard: ConflictGuard,
    notifier: Arc<dyn NotificationSink>,
}

impl PublicBookingService {
    pub fn new(
        business_repo: BusinessRepository,
        catalog_repo: CatalogRepository,
        booking_repo: BookingRepository,
        availability: AvailabilityService,
        guard: ConflictGuard,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            business_repo,
            catalog_repo,
            booking_repo,
            availability,
            guard,
            notifier,
        }
    }

    // =========================================================================
    //  PERFIL PÚBLICO
    // =========================================================================

    pub async fn business_by_slug<'a, A>(&self, conn: A, slug: &str) -> Result<Business, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.business_repo
            .find_by_slug(&mut *conn, slug)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("business".into()))
    }

    pub async fn active_services<'a, A>(
        &self,
        conn: A,
        business: &Business,
    ) -> Result<Vec<Service>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.catalog_repo
            .list_services(&mut *conn, business.id, true)
            .await
    }

    pub async fn bookable_staff<'a, A>(
        &self,
        conn: A,
        business: &Business,
    ) -> Result<Vec<User>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.catalog_repo
            .list_bookable_staff(&mut *conn, business.id)
            .await
    }

    // =========================================================================
    //  DISPONIBILIDADE PÚBLICA
    // =========================================================================

    pub async fn availability<'a, A>(
        &self,
        conn: A,
        business: &Business,
        service_id: Uuid,
        staff_id: Option<Uuid>,
        date: chrono::NaiveDate,
    ) -> Result<Vec<Slot>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let staff_id = match staff_id {
            Some(id) => id,
            None => match self.availability.default_staff(&mut *conn, business.id).await? {
                Some(staff) => staff.id,
                None => return Ok(Vec::new()),
            },
        };

        self.availability
            .slots_for_day(&mut *conn, business.id, staff_id, service_id, date)
            .await
    }

    // =========================================================================
    //  CRIAÇÃO COM OTP
    // =========================================================================

    pub async fn create<'a, A>(
        &self,
        conn: A,
        slug: &str,
        input: PublicBookingInput,
    ) -> Result<Booking, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let business = self
            .business_repo
            .find_by_slug(&mut *conn, slug)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("business".into()))?;

        let service = self
            .catalog_repo
            .find_service(&mut *conn, input.service_id)
            .await?
            .filter(|s| s.business_id == business.id)
            .ok_or_else(|| AppError::ResourceNotFound("service".into()))?;

        // escolhe o profissional (ou o padrão do estabelecimento)
        let staff = match input.staff_id {
            Some(id) => self.catalog_repo.find_user(&mut *conn, id).await?,
            None => self.catalog_repo.first_bookable_staff(&mut *conn, business.id).await?,
        }
        .filter(|s| s.business_id == business.id && s.is_active && s.role.is_bookable())
        .ok_or_else(|| AppError::field_error("staff_id", "invalid_staff"))?;

        let phone = normalize_phone(&input.client_phone)
            .ok_or_else(|| AppError::field_error("client_phone", "invalid_phone"))?;

        // O horário pedido precisa estar entre os slots recalculados agora
        let slots = self
            .availability
            .slots_for_day(
                &mut *conn,
                business.id,
                staff.id,
                service.id,
                input.starts_at.date(),
            )
            .await?;
        if !slot_matches(&slots, input.starts_at) {
            return Err(AppError::field_error("starts_at", "slot_not_available"));
        }

        let ends_at = input.starts_at + Duration::minutes(service.duration_minutes as i64);
        let range = TimeRange::new(input.starts_at, ends_at);

        let room_id = match (business.business_type.has_rooms(), input.room_id) {
            (true, Some(room_id)) => self
                .catalog_repo
                .find_room(&mut *conn, business.id, room_id)
                .await?
                .map(|room| room.id),
            _ => None,
        };

        let config = CalendarConfig::for_business(&business);
        let now_local = config.now_local();

        let code = random_otp_code();
        let code_hash = bcrypt::hash(&code, bcrypt::DEFAULT_COST)?;
        let expires_at = now_local + Duration::minutes(OTP_TTL_MINUTES);

        // Guard + insert na mesma transação: o slot exibido pode ter sido
        // consumido entre o recálculo acima e o commit.
        let mut tx = sqlx::Acquire::begin(&mut *conn).await?;

        self.guard
            .assert_no_overlap(&mut *tx, business.id, staff.id, &range, None)
            .await?;
        self.guard
            .assert_not_blocked(&mut *tx, business.id, staff.id, &range)
            .await?;

        let booking_code = loop {
            let candidate = random_booking_code();
            if !self.booking_repo.code_exists(&mut *tx, &candidate).await? {
                break candidate;
            }
        };

        let booking = self
            .booking_repo
            .insert(
                &mut *tx,
                NewBooking {
                    business_id: business.id,
                    service_id: service.id,
                    staff_id: staff.id,
                    room_id,
                    client_name: &input.client_name,
                    client_phone: &phone,
                    starts_at: range.start,
                    ends_at: range.end,
                    status: BookingStatus::Pending,
                    notes: input.notes.as_deref(),
                    booking_code: &booking_code,
                    final_price: Some(service.price),
                    currency: &service.currency,
                    phone_verification_code_hash: Some(&code_hash),
                    phone_verification_expires_at: Some(expires_at),
                },
            )
            .await?;

        tx.commit().await?;

        self.notifier
            .verification_code_issued(&phone, &code, expires_at)
            .await;
        self.notifier.booking_created(&booking).await;

        Ok(booking)
    }

    // =========================================================================
    //  VERIFICAÇÃO / CONSULTA / CANCELAMENTO POR CÓDIGO
    // =========================================================================

    pub async fn show<'a, A>(&self, conn: A, booking_code: &str) -> Result<Booking, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.booking_repo
            .find_by_code(&mut *conn, booking_code)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("booking".into()))
    }

    /// Confere o OTP. Devolve (booking, já_estava_verificado).
    pub async fn verify_phone<'a, A>(
        &self,
        conn: A,
        booking_code: &str,
        otp: &str,
    ) -> Result<(Booking, bool), AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let booking = self
            .booking_repo
            .find_by_code(&mut *conn, booking_code)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("booking".into()))?;

        let business = self
            .business_repo
            .find_by_id(&mut *conn, booking.business_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("business".into()))?;
        let now_local = CalendarConfig::for_business(&business).now_local();

        match verification_gate(
            booking.phone_verified_at,
            booking.phone_verification_expires_at,
            booking.phone_verification_attempts,
            now_local,
        ) {
            VerifyGate::AlreadyVerified => return Ok((booking, true)),
            VerifyGate::Expired => return Err(AppError::CodeExpired),
            VerifyGate::TooManyAttempts => return Err(AppError::TooManyAttempts),
            VerifyGate::CheckCode => {}
        }

        // Errar também consome tentativa
        self.booking_repo
            .increment_verification_attempts(&mut *conn, booking.id)
            .await?;

        let hash = booking
            .phone_verification_code_hash
            .as_deref()
            .ok_or(AppError::CodeExpired)?;
        if !bcrypt::verify(otp, hash)? {
            return Err(AppError::InvalidCode);
        }

        let verified = self
            .booking_repo
            .mark_phone_verified(&mut *conn, booking.id, now_local)
            .await?;

        Ok((verified, false))
    }

    /// Cancelamento pelo cliente; estados terminais são no-op.
    pub async fn cancel<'a, A>(&self, conn: A, booking_code: &str) -> Result<Booking, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let booking = self
            .booking_repo
            .find_by_code(&mut *conn, booking_code)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("booking".into()))?;

        if booking.status.is_terminal() {
            return Ok(booking);
        }

        self.booking_repo
            .update_status(&mut *conn, booking.id, BookingStatus::Cancelled)
            .await
    }
}

// ── Núcleo puro ──────────────────────────────────────────────────────────

fn random_otp_code() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}

fn slot_matches(slots: &[Slot], requested: NaiveDateTime) -> bool {
    slots.iter().any(|slot| slot.starts_at == requested)
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum VerifyGate {
    AlreadyVerified,
    Expired,
    TooManyAttempts,
    CheckCode,
}

/// Decide o destino da tentativa antes de olhar o código, na ordem do fluxo:
/// já verificado > expirado > estourou tentativas > conferir hash.
pub(crate) fn verification_gate(
    verified_at: Option<NaiveDateTime>,
    expires_at: Option<NaiveDateTime>,
    attempts: i32,
    now: NaiveDateTime,
) -> VerifyGate {
    if verified_at.is_some() {
        return VerifyGate::AlreadyVerified;
    }
    match expires_at {
        None => return VerifyGate::Expired,
        Some(expires) if now > expires => return VerifyGate::Expired,
        _ => {}
    }
    if attempts >= MAX_OTP_ATTEMPTS {
        return VerifyGate::TooManyAttempts;
    }
    VerifyGate::CheckCode
}

/// Dígitos com "+" opcional na frente; separadores comuns são tolerados.
pub(crate) fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut normalized = String::new();

    for (i, c) in trimmed.chars().enumerate() {
        if c.is_ascii_digit() {
            normalized.push(c);
        } else if c == '+' && i == 0 {
            normalized.push(c);
        } else if matches!(c, ' ' | '-' | '(' | ')' | '.') {
            continue;
        } else {
            return None;
        }
    }

    let digits = normalized.trim_start_matches('+').len();
    if (5..=15).contains(&digits) {
        Some(normalized)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    // ── verification_gate ────────────────────────────────

    #[test]
    fn gate_lets_a_fresh_code_through() {
        let gate = verification_gate(None, Some(dt(10, 10)), 0, dt(10, 5));
        assert_eq!(gate, VerifyGate::CheckCode);
    }

    #[test]
    fn gate_is_idempotent_for_verified_bookings() {
        let gate = verification_gate(Some(dt(9, 0)), None, 0, dt(10, 0));
        assert_eq!(gate, VerifyGate::AlreadyVerified);
    }

    #[test]
    fn gate_expires_after_ttl() {
        let gate = verification_gate(None, Some(dt(10, 0)), 0, dt(10, 1));
        assert_eq!(gate, VerifyGate::Expired);
        // sem expiração registrada = expirado
        let gate = verification_gate(None, None, 0, dt(10, 1));
        assert_eq!(gate, VerifyGate::Expired);
        // exatamente no limite ainda vale
        let gate = verification_gate(None, Some(dt(10, 0)), 0, dt(10, 0));
        assert_eq!(gate, VerifyGate::CheckCode);
    }

    #[test]
    fn gate_caps_attempts_at_five() {
        let gate = verification_gate(None, Some(dt(11, 0)), MAX_OTP_ATTEMPTS, dt(10, 0));
        assert_eq!(gate, VerifyGate::TooManyAttempts);
        let gate = verification_gate(None, Some(dt(11, 0)), MAX_OTP_ATTEMPTS - 1, dt(10, 0));
        assert_eq!(gate, VerifyGate::CheckCode);
    }

    #[test]
    fn expiry_is_checked_before_attempts() {
        let gate = verification_gate(None, Some(dt(9, 0)), MAX_OTP_ATTEMPTS, dt(10, 0));
        assert_eq!(gate, VerifyGate::Expired);
    }

    // ── normalize_phone ──────────────────────────────────

    #[test]
    fn phone_normalization_strips_separators() {
        assert_eq!(
            normalize_phone("+55 (11) 99999-8888").as_deref(),
            Some("+5511999998888")
        );
        assert_eq!(normalize_phone("011 4002-8922").as_deref(), Some("01140028922"));
    }

    #[test]
    fn phone_normalization_rejects_junk() {
        assert!(normalize_phone("call me").is_none());
        assert!(normalize_phone("123").is_none());
        assert!(normalize_phone("+55 11 99999 8888 99999 8888").is_none());
        assert!(normalize_phone("99+99999").is_none());
    }

    // ── slot_matches / otp ───────────────────────────────

    #[test]
    fn slot_match_requires_exact_start() {
        let slots = vec![Slot {
            starts_at: dt(9, 30),
            ends_at: dt(10, 30),
            available_rooms: None,
        }];
        assert!(slot_matches(&slots, dt(9, 30)));
        assert!(!slot_matches(&slots, dt(9, 45)));
    }

    #[test]
    fn otp_is_four_digits() {
        for _ in 0..32 {
            let code = random_otp_code();
            assert_eq!(code.len(), 4);
            assert!(code.parse::<u16>().is_ok());
        }
    }
}
