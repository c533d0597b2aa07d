pub mod availability;
pub mod blocks;
pub mod bookings;
pub mod business;
pub mod catalog;
pub mod public;
pub mod schedule;
