// src/middleware/tenancy.rs

// O core não autentica ninguém: o gateway upstream já validou o token e nos
// entrega o contexto confiável via cabeçalhos. Aqui ele vira um valor
// explícito (`ActorContext`) que atravessa as assinaturas — nunca estado
// ambiente/global.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
};
use uuid::Uuid;

use crate::{common::error::ApiError, models::catalog::UserRole};

const BUSINESS_ID_HEADER: &str = "x-business-id";
const ACTOR_ID_HEADER: &str = "x-actor-id";
const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Quem está agindo, e em nome de qual estabelecimento.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub business_id: Uuid,
    pub user_id: Uuid,
    pub role: UserRole,
}

impl ActorContext {
    /// Toda query de escrita/leitura interna passa por aqui antes de tocar
    /// uma entidade: a entidade precisa pertencer ao tenant do ator.
    /// `super_admin` enxerga todos os tenants.
    pub fn assert_same_business(
        &self,
        entity_business_id: Uuid,
    ) -> Result<(), crate::common::error::AppError> {
        if self.role.is_super_admin() || entity_business_id == self.business_id {
            Ok(())
        } else {
            Err(crate::common::error::AppError::TenantMismatch)
        }
    }
}

fn header_uuid(headers: &HeaderMap, name: &str) -> Result<Uuid, ApiError> {
    let value = headers
        .get(name)
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                format!("O cabeçalho {name} é obrigatório."),
            )
        })?
        .to_str()
        .map_err(|_| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                format!("O cabeçalho {name} contém caracteres inválidos."),
            )
        })?;

    Uuid::parse_str(value).map_err(|_| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("O cabeçalho {name} não é um UUID."),
        )
    })
}

impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let business_id = header_uuid(&parts.headers, BUSINESS_ID_HEADER)?;
        let user_id = header_uuid(&parts.headers, ACTOR_ID_HEADER)?;

        let role_raw = parts
            .headers
            .get(ACTOR_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    format!("O cabeçalho {ACTOR_ROLE_HEADER} é obrigatório."),
                )
            })?;

        let role = UserRole::parse(role_raw).ok_or_else(|| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                format!("Papel desconhecido: {role_raw}."),
            )
        })?;

        Ok(ActorContext {
            business_id,
            user_id,
            role,
        })
    }
}
