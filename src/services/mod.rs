pub mod availability;
pub use availability::AvailabilityService;
pub mod blocks;
pub use blocks::BlockService;
pub mod booking;
pub use booking::BookingService;
pub mod conflict;
pub use conflict::ConflictGuard;
pub mod notify;
pub use notify::{LogNotifier, NotificationSink};
pub mod public_booking;
pub use public_booking::PublicBookingService;
pub mod schedule;
pub use schedule::ScheduleService;
