// src/common/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Erro de domínio. Tudo que atravessa services/repos vive aqui; os handlers
// convertem para `ApiError` na borda HTTP via `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    ValidationError(#[from] validator::ValidationErrors),

    // Referência cruzando tenants (serviço/profissional de outro estabelecimento)
    #[error("invalid business context")]
    TenantMismatch,

    #[error("time slot is already booked")]
    SlotTaken,

    #[error("time falls in a blocked period")]
    TimeBlocked,

    #[error("time is outside working hours")]
    OutsideWorkingHours,

    #[error("service duration out of bounds")]
    InvalidServiceDuration,

    #[error("end must be after start")]
    InvalidRange,

    #[error("blocked period exceeds the maximum span")]
    RangeTooLarge,

    #[error("an overlapping block already exists")]
    OverlapExists,

    #[error("invalid verification code")]
    InvalidCode,

    #[error("verification code expired")]
    CodeExpired,

    #[error("too many verification attempts")]
    TooManyAttempts,

    #[error("status transition not allowed")]
    InvalidTransition,

    #[error("{0} not found")]
    ResourceNotFound(String),

    #[error("forbidden")]
    Forbidden,

    #[error("database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),

    #[error("hashing error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),
}

impl AppError {
    /// Atalho para erro de validação de um campo só, com código em vez de frase.
    pub fn field_error(field: &str, code: &'static str) -> Self {
        let mut errors = validator::ValidationErrors::new();
        let mut err = validator::ValidationError::new(code);
        err.message = Some(code.into());

        // Leak seguro: nomes de campo são um conjunto pequeno e fixo
        let static_field: &'static str = Box::leak(field.to_string().into_boxed_str());
        errors.add(static_field, err);

        AppError::ValidationError(errors)
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::TenantMismatch => "tenant_mismatch",
            AppError::SlotTaken => "slot_taken",
            AppError::TimeBlocked => "time_blocked",
            AppError::OutsideWorkingHours => "outside_working_hours",
            AppError::InvalidServiceDuration => "invalid_service_duration",
            AppError::InvalidRange => "invalid_range",
            AppError::RangeTooLarge => "range_too_large",
            AppError::OverlapExists => "overlap_exists",
            AppError::InvalidCode => "invalid_code",
            AppError::CodeExpired => "code_expired",
            AppError::TooManyAttempts => "too_many_attempts",
            AppError::InvalidTransition => "invalid_transition",
            AppError::ResourceNotFound(_) => "not_found",
            AppError::Forbidden => "forbidden",
            AppError::DatabaseError(_) | AppError::Internal(_) | AppError::BcryptError(_) => {
                "internal"
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            AppError::DatabaseError(_) | AppError::Internal(_) | AppError::BcryptError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            // Conflitos de agenda e entradas malformadas respondem 422
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Campo ao qual o erro se atribui na resposta (quando faz sentido).
    fn field(&self) -> Option<&'static str> {
        match self {
            AppError::SlotTaken | AppError::TimeBlocked | AppError::OutsideWorkingHours => {
                Some("starts_at")
            }
            AppError::InvalidRange | AppError::RangeTooLarge | AppError::OverlapExists => {
                Some("ends_at")
            }
            AppError::InvalidCode | AppError::CodeExpired | AppError::TooManyAttempts => {
                Some("otp")
            }
            AppError::InvalidServiceDuration => Some("service_id"),
            AppError::TenantMismatch => Some("business"),
            _ => None,
        }
    }

    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let code = self.code();
        let status = self.status();
        let field = self.field();

        let details = match &self {
            AppError::ValidationError(errors) => {
                let mut map = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let codes: Vec<String> =
                        field_errors.iter().map(|e| e.code.to_string()).collect();
                    map.insert(field.to_string(), json!(codes));
                }
                Some(serde_json::Value::Object(map))
            }
            _ => None,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O detalhe fica no log; o cliente recebe só a mensagem genérica.
            tracing::error!("internal error: {self:?}");
        }

        ApiError {
            status,
            error: store.message(&locale.0, code),
            code,
            field,
            details,
        }
    }
}

// O que efetivamente sai pela borda HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub code: &'static str,
    pub field: Option<&'static str>,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            code: "validation",
            field: None,
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::Map::new();
        body.insert("error".into(), json!(self.error));
        body.insert("code".into(), json!(self.code));
        if let Some(field) = self.field {
            body.insert("field".into(), json!(field));
        }
        if let Some(details) = self.details {
            body.insert("details".into(), details);
        }
        (self.status, Json(serde_json::Value::Object(body))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AppError::SlotTaken.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::TimeBlocked.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::TooManyAttempts.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::ResourceNotFound("booking".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn field_error_carries_the_field() {
        let err = AppError::field_error("staff_id", "invalid_staff");
        let AppError::ValidationError(errors) = &err else {
            panic!("expected ValidationError");
        };
        assert!(errors.field_errors().contains_key("staff_id"));
    }
}
