// src/services/blocks.rs

// Registro de bloqueios ad-hoc (pausa, folga, manutenção). Validações na
// criação: fim > início, vão máximo de 14 dias, e nenhuma sobreposição com
// bloqueio já existente do mesmo escopo.

use chrono::NaiveDateTime;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BlockRepository, CatalogRepository},
    middleware::tenancy::ActorContext,
    models::{
        block::{BookingBlock, MAX_BLOCK_SPAN_DAYS},
        schedule::TimeRange,
    },
};

#[derive(Clone)]
pub struct BlockService {
    block_repo: BlockRepository,
    catalog_repo: CatalogRepository,
}

impl BlockService {
    pub fn new(block_repo: BlockRepository, catalog_repo: CatalogRepository) -> Self {
        Self {
            block_repo,
            catalog_repo,
        }
    }

    pub async fn create<'a, A>(
        &self,
        conn: A,
        actor: &ActorContext,
        staff_id: Option<Uuid>,
        range: TimeRange,
        reason: Option<&str>,
    ) -> Result<BookingBlock, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        if !actor.role.can_manage_schedule() {
            return Err(AppError::Forbidden);
        }

        validate_block_range(&range)?;

        let mut tx = conn.begin().await?;

        if let Some(staff_id) = staff_id {
            let staff = self
                .catalog_repo
                .find_user(&mut *tx, staff_id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound("staff".into()))?;
            actor.assert_same_business(staff.business_id)?;
        }

        let overlaps = self
            .block_repo
            .scope_overlap_exists(&mut *tx, actor.business_id, staff_id, &range)
            .await?;
        if overlaps {
            return Err(AppError::OverlapExists);
        }

        let block = self
            .block_repo
            .create(&mut *tx, actor.business_id, staff_id, &range, reason)
            .await?;
        tx.commit().await?;

        Ok(block)
    }

    pub async fn list_range<'a, A>(
        &self,
        conn: A,
        actor: &ActorContext,
        from: NaiveDateTime,
        to: NaiveDateTime,
        staff_id: Option<Uuid>,
    ) -> Result<Vec<BookingBlock>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.block_repo
            .list_range(&mut *conn, actor.business_id, from, to, staff_id)
            .await
    }

    pub async fn delete<'a, A>(
        &self,
        conn: A,
        actor: &ActorContext,
        block_id: Uuid,
    ) -> Result<(), AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        if !actor.role.can_manage_schedule() {
            return Err(AppError::Forbidden);
        }

        let mut conn = conn.acquire().await?;
        let deleted = self
            .block_repo
            .delete(&mut *conn, actor.business_id, block_id)
            .await?;

        if deleted == 0 {
            return Err(AppError::ResourceNotFound("block".into()));
        }
        Ok(())
    }
}

pub(crate) fn validate_block_range(range: &TimeRange) -> Result<(), AppError> {
    if range.end <= range.start {
        return Err(AppError::InvalidRange);
    }
    if range.end - range.start > chrono::Duration::days(MAX_BLOCK_SPAN_DAYS) {
        return Err(AppError::RangeTooLarge);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn dt(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, 0, 0).unwrap())
    }

    #[test]
    fn rejects_inverted_and_empty_ranges() {
        assert!(matches!(
            validate_block_range(&TimeRange::new(dt(10, 13), dt(10, 12))),
            Err(AppError::InvalidRange)
        ));
        assert!(matches!(
            validate_block_range(&TimeRange::new(dt(10, 12), dt(10, 12))),
            Err(AppError::InvalidRange)
        ));
    }

    #[test]
    fn rejects_spans_over_fourteen_days() {
        assert!(matches!(
            validate_block_range(&TimeRange::new(dt(1, 0), dt(16, 0))),
            Err(AppError::RangeTooLarge)
        ));
        // exatamente 14 dias passa
        assert!(validate_block_range(&TimeRange::new(dt(1, 0), dt(15, 0))).is_ok());
    }

    #[test]
    fn accepts_ordinary_ranges() {
        assert!(validate_block_range(&TimeRange::new(dt(10, 12), dt(10, 13))).is_ok());
    }
}
