// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    common::i18n::I18nStore,
    db::{
        BlockRepository, BookingRepository, BusinessRepository, CatalogRepository,
        ScheduleRepository,
    },
    services::{
        AvailabilityService, BlockService, BookingService, ConflictGuard, LogNotifier,
        NotificationSink, PublicBookingService, ScheduleService,
    },
};

// O estado compartilhado da aplicação: pool + grafo de serviços montado uma
// vez na subida.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: I18nStore,

    pub business_repo: BusinessRepository,
    pub catalog_repo: CatalogRepository,

    pub availability_service: AvailabilityService,
    pub booking_service: BookingService,
    pub block_service: BlockService,
    pub schedule_service: ScheduleService,
    pub public_service: PublicBookingService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL deve ser definida"))?;

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("conexão com o banco de dados estabelecida");

        // --- Monta o grafo de dependências ---
        let business_repo = BusinessRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let schedule_repo = ScheduleRepository::new(db_pool.clone());
        let block_repo = BlockRepository::new(db_pool.clone());
        let booking_repo = BookingRepository::new(db_pool.clone());

        let schedule_service = ScheduleService::new(schedule_repo, catalog_repo.clone());
        let guard = ConflictGuard::new(
            booking_repo.clone(),
            block_repo.clone(),
            schedule_service.clone(),
        );
        let availability_service = AvailabilityService::new(
            business_repo.clone(),
            catalog_repo.clone(),
            booking_repo.clone(),
            block_repo.clone(),
            schedule_service.clone(),
        );

        let notifier: Arc<dyn NotificationSink> = Arc::new(LogNotifier);

        let booking_service = BookingService::new(
            booking_repo.clone(),
            catalog_repo.clone(),
            business_repo.clone(),
            guard.clone(),
            notifier.clone(),
        );
        let block_service = BlockService::new(block_repo, catalog_repo.clone());
        let public_service = PublicBookingService::new(
            business_repo.clone(),
            catalog_repo.clone(),
            booking_repo,
            availability_service.clone(),
            guard,
            notifier,
        );

        Ok(Self {
            db_pool,
            i18n_store: I18nStore::new(),
            business_repo,
            catalog_repo,
            availability_service,
            booking_service,
            block_service,
            schedule_service,
            public_service,
        })
    }
}
