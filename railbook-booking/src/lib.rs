pub mod memory;
pub mod models;
pub mod pnr;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use models::{Booking, BookingStatus, Gender, Passenger, PaymentStatus, TrainSnapshot};
pub use repository::{BookingRepository, CommitOutcome, ReleaseOutcome};
pub use service::{Actor, ReservationError, ReservationService};
