// src/services/notify.rs

// Saída de notificações (SMS/WhatsApp/e-mail) é colaborador externo: o core
// só emite eventos. O driver padrão loga — seguro para dev; um provedor real
// entra por trás desta trait sem tocar no resto.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::models::booking::Booking;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Código de verificação emitido para um agendamento público.
    async fn verification_code_issued(&self, phone: &str, code: &str, expires_at: NaiveDateTime);

    /// Agendamento criado (resumo).
    async fn booking_created(&self, booking: &Booking);
}

#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn verification_code_issued(&self, phone: &str, code: &str, expires_at: NaiveDateTime) {
        tracing::info!(
            to = phone,
            code = code,
            expires_at = %expires_at,
            "[notify:log] verification code issued"
        );
    }

    async fn booking_created(&self, booking: &Booking) {
        tracing::info!(
            booking_code = booking.booking_code.as_deref().unwrap_or("-"),
            staff_id = %booking.staff_id,
            starts_at = %booking.starts_at,
            "[notify:log] booking created"
        );
    }
}
