pub mod block_repo;
pub use block_repo::BlockRepository;
pub mod booking_repo;
pub use booking_repo::BookingRepository;
pub mod business_repo;
pub use business_repo::BusinessRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod schedule_repo;
pub use schedule_repo::ScheduleRepository;
