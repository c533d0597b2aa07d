// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

/// Extrator de idioma a partir do Accept-Language ("pt-BR" -> "pt").
pub struct Locale(pub String);

const DEFAULT_LANG: &str = "en";

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let lang = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| {
                // Respeita a ordem de preferência do cliente; só o idioma base importa
                accept_language::parse(raw).into_iter().next().map(|tag| {
                    tag.split('-').next().unwrap_or(&tag).to_string()
                })
            })
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Ok(Locale(lang))
    }
}
