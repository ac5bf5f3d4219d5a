use crate::models::Booking;
use async_trait::async_trait;
use uuid::Uuid;

/// Result of the atomic reserve commit. The storage layer performs the
/// conditional seat decrement and the booking insert in one transaction and
/// reports which way it went; a plain read-then-write is not an acceptable
/// implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Decrement and insert both landed.
    Committed,
    /// The class row had fewer seats than requested; nothing was written.
    InsufficientSeats { available: i32 },
    /// The train exists but does not carry the requested class.
    ClassMissing,
    /// The train row is gone.
    TrainMissing,
    /// The booking's PNR collided with an existing ledger entry; nothing was
    /// written. The caller draws a new PNR and retries.
    DuplicatePnr,
}

/// Result of the atomic release. Status flip and seat restoration happen in
/// one transaction; restoration is skipped (not failed) when the train or
/// class row no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released { seats_restored: bool },
    AlreadyCancelled,
    NotFound,
}

/// Repository trait for the booking ledger and the inventory transactions
/// that tie it to the train catalog.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Atomically decrement `booking.seat_count()` seats on the booking's
    /// train/class row and persist the booking. Either both effects are
    /// durably visible or neither.
    async fn commit_reservation(
        &self,
        booking: &Booking,
    ) -> Result<CommitOutcome, Box<dyn std::error::Error + Send + Sync>>;

    /// Atomically flip the booking to Cancelled (only if not already) and
    /// return its passengers' seats to the originating class row.
    async fn release_reservation(
        &self,
        booking_id: Uuid,
    ) -> Result<ReleaseOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_booking(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    async fn find_by_pnr(
        &self,
        pnr: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    /// A user's bookings, most recent first.
    async fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    /// Every booking in the ledger, most recent first.
    async fn list_all(
        &self,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>>;
}
