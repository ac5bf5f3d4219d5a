use crate::models::{Booking, BookingStatus, Passenger};
use crate::pnr::PnrAllocator;
use crate::repository::{BookingRepository, CommitOutcome, ReleaseOutcome};
use chrono::NaiveDate;
use railbook_catalog::{TrainRepository, TravelClass};
use std::sync::Arc;
use uuid::Uuid;

/// Who is asking. Derived from the verified JWT claims at the HTTP boundary.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Actor {
    fn may_access(&self, booking: &Booking) -> bool {
        self.is_admin || booking.user_id == self.user_id
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("Train not found")]
    TrainNotFound,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Train does not offer class {0}")]
    UnknownClass(String),

    #[error("Invalid passenger list: {0}")]
    InvalidPassengers(String),

    #[error("Not enough seats available: requested {requested}, available {available}")]
    CapacityExceeded { requested: i32, available: i32 },

    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    #[error("Not authorized to access this booking")]
    Forbidden,

    #[error("Could not allocate a unique PNR")]
    PnrExhausted,

    #[error("Storage unavailable: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ReservationError {
    pub fn storage(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        ReservationError::Storage(err)
    }
}

/// Upper bound on commit retries when the storage-level unique index reports
/// a PNR collision that slipped past the allocator's pre-check.
const MAX_COMMIT_ATTEMPTS: usize = 5;

/// Ties the train catalog and the booking ledger together: reserve seats on
/// create, release them on cancel, and keep every booking behind a unique
/// PNR. The capacity check that matters runs inside the ledger's atomic
/// commit; the checks here exist to fail early with precise errors.
pub struct ReservationService {
    trains: Arc<dyn TrainRepository>,
    ledger: Arc<dyn BookingRepository>,
    pnr: PnrAllocator,
}

impl ReservationService {
    pub fn new(trains: Arc<dyn TrainRepository>, ledger: Arc<dyn BookingRepository>) -> Self {
        let pnr = PnrAllocator::new(ledger.clone());
        Self {
            trains,
            ledger,
            pnr,
        }
    }

    /// Reserve seats and write the ledger entry. Exactly one seat decrement
    /// and one booking insert per successful call, atomic together.
    pub async fn reserve(
        &self,
        user_id: Uuid,
        train_id: Uuid,
        class: TravelClass,
        journey_date: NaiveDate,
        passengers: Vec<Passenger>,
    ) -> Result<Booking, ReservationError> {
        validate_passengers(&passengers)?;
        let requested = passengers.len() as i32;

        let train = self
            .trains
            .get_train(train_id)
            .await
            .map_err(ReservationError::storage)?
            .filter(|t| t.is_active)
            .ok_or(ReservationError::TrainNotFound)?;

        let row = train
            .class_row(class)
            .ok_or_else(|| ReservationError::UnknownClass(class.to_string()))?;

        if row.seats_available < requested {
            return Err(ReservationError::CapacityExceeded {
                requested,
                available: row.seats_available,
            });
        }

        let mut booking = Booking::confirmed(
            user_id,
            &train,
            class,
            row.price,
            journey_date,
            passengers,
            String::new(),
        );

        for _ in 0..MAX_COMMIT_ATTEMPTS {
            booking.pnr = self.pnr.allocate().await?;
            match self
                .ledger
                .commit_reservation(&booking)
                .await
                .map_err(ReservationError::storage)?
            {
                CommitOutcome::Committed => {
                    tracing::info!(
                        booking_id = %booking.id,
                        pnr = %booking.pnr,
                        train = %booking.train.train_number,
                        class = %booking.class,
                        seats = requested,
                        "reservation confirmed"
                    );
                    return Ok(booking);
                }
                CommitOutcome::DuplicatePnr => {
                    tracing::warn!(pnr = %booking.pnr, "PNR collided at commit, retrying");
                    continue;
                }
                CommitOutcome::InsufficientSeats { available } => {
                    return Err(ReservationError::CapacityExceeded {
                        requested,
                        available,
                    });
                }
                CommitOutcome::ClassMissing => {
                    return Err(ReservationError::UnknownClass(class.to_string()));
                }
                CommitOutcome::TrainMissing => return Err(ReservationError::TrainNotFound),
            }
        }

        Err(ReservationError::PnrExhausted)
    }

    /// Cancel a booking and return its seats to the originating class row.
    /// Idempotent at the status level: the second call fails with
    /// AlreadyCancelled before any inventory mutation.
    pub async fn release(
        &self,
        booking_id: Uuid,
        actor: Actor,
    ) -> Result<Booking, ReservationError> {
        let mut booking = self
            .ledger
            .get_booking(booking_id)
            .await
            .map_err(ReservationError::storage)?
            .ok_or(ReservationError::BookingNotFound)?;

        if !actor.may_access(&booking) {
            return Err(ReservationError::Forbidden);
        }
        if booking.status == BookingStatus::Cancelled {
            return Err(ReservationError::AlreadyCancelled);
        }

        match self
            .ledger
            .release_reservation(booking_id)
            .await
            .map_err(ReservationError::storage)?
        {
            ReleaseOutcome::Released { seats_restored } => {
                if !seats_restored {
                    // The booking stays the authoritative record of intent;
                    // a vanished train or class row only loses the
                    // restoration, not the cancellation.
                    tracing::warn!(
                        booking_id = %booking.id,
                        train = %booking.train.train_number,
                        class = %booking.class,
                        "cancelled booking without restoring seats"
                    );
                }
                tracing::info!(booking_id = %booking.id, pnr = %booking.pnr, "booking cancelled");
                booking.cancel();
                Ok(booking)
            }
            ReleaseOutcome::AlreadyCancelled => Err(ReservationError::AlreadyCancelled),
            ReleaseOutcome::NotFound => Err(ReservationError::BookingNotFound),
        }
    }

    /// Anonymous status lookup. Holding a PNR is the only credential, so
    /// whoever has the string sees the passenger manifest.
    pub async fn lookup_by_pnr(&self, pnr: &str) -> Result<Option<Booking>, ReservationError> {
        if !railbook_core::pnr::is_well_formed(pnr) {
            return Ok(None);
        }
        self.ledger
            .find_by_pnr(pnr)
            .await
            .map_err(ReservationError::storage)
    }

    /// A booking by id, visible to its owner or an administrator.
    pub async fn get_booking(
        &self,
        booking_id: Uuid,
        actor: Actor,
    ) -> Result<Booking, ReservationError> {
        let booking = self
            .ledger
            .get_booking(booking_id)
            .await
            .map_err(ReservationError::storage)?
            .ok_or(ReservationError::BookingNotFound)?;
        if !actor.may_access(&booking) {
            return Err(ReservationError::Forbidden);
        }
        Ok(booking)
    }

    /// A user's own bookings, most recent first.
    pub async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Booking>, ReservationError> {
        self.ledger
            .list_by_user(user_id)
            .await
            .map_err(ReservationError::storage)
    }

    /// The whole ledger, most recent first. Administrators only.
    pub async fn list_all(&self, actor: Actor) -> Result<Vec<Booking>, ReservationError> {
        if !actor.is_admin {
            return Err(ReservationError::Forbidden);
        }
        self.ledger
            .list_all()
            .await
            .map_err(ReservationError::storage)
    }
}

fn validate_passengers(passengers: &[Passenger]) -> Result<(), ReservationError> {
    if passengers.is_empty() {
        return Err(ReservationError::InvalidPassengers(
            "at least one passenger is required".to_string(),
        ));
    }
    for passenger in passengers {
        if passenger.name.trim().is_empty() {
            return Err(ReservationError::InvalidPassengers(
                "passenger name must not be empty".to_string(),
            ));
        }
        if passenger.age <= 0 {
            return Err(ReservationError::InvalidPassengers(format!(
                "invalid age {} for {}",
                passenger.age, passenger.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::Gender;
    use crate::testing::{passengers, sample_train};
    use railbook_catalog::Train;

    async fn seeded(classes: &[(TravelClass, i64, i32)]) -> (Arc<MemoryStore>, ReservationService, Train) {
        let store = Arc::new(MemoryStore::new());
        let train = sample_train(classes);
        store.create_train(&train).await.unwrap();
        let service = ReservationService::new(store.clone(), store.clone());
        (store, service, train)
    }

    async fn seats_left(store: &MemoryStore, train_id: Uuid, class: TravelClass) -> i32 {
        store
            .get_train(train_id)
            .await
            .unwrap()
            .unwrap()
            .class_row(class)
            .unwrap()
            .seats_available
    }

    fn owner() -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn reserve_decrements_and_prices() {
        // Scenario A: 80 seats at 1500, two passengers.
        let (store, service, train) = seeded(&[(TravelClass::ThreeAc, 1500, 80)]).await;
        let user = Uuid::new_v4();

        let booking = service
            .reserve(
                user,
                train.id,
                TravelClass::ThreeAc,
                NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                passengers(2),
            )
            .await
            .unwrap();

        assert_eq!(booking.total_fare, 3000);
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_status, crate::models::PaymentStatus::Completed);
        assert!(railbook_core::pnr::is_well_formed(&booking.pnr));
        assert_eq!(seats_left(&store, train.id, TravelClass::ThreeAc).await, 78);
    }

    #[tokio::test]
    async fn reserve_fails_without_mutation_when_capacity_short() {
        // Scenario B: one seat left, two requested.
        let (store, service, train) = seeded(&[(TravelClass::ThreeAc, 1500, 1)]).await;

        let err = service
            .reserve(
                Uuid::new_v4(),
                train.id,
                TravelClass::ThreeAc,
                NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                passengers(2),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReservationError::CapacityExceeded {
                requested: 2,
                available: 1
            }
        ));
        assert_eq!(seats_left(&store, train.id, TravelClass::ThreeAc).await, 1);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn release_restores_seats_and_is_idempotent() {
        // Scenario C: release two seats on 2AC, then release again.
        let (store, service, train) = seeded(&[(TravelClass::TwoAc, 2500, 40)]).await;
        let actor = owner();

        let booking = service
            .reserve(
                actor.user_id,
                train.id,
                TravelClass::TwoAc,
                NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                passengers(2),
            )
            .await
            .unwrap();
        assert_eq!(seats_left(&store, train.id, TravelClass::TwoAc).await, 38);

        let cancelled = service.release(booking.id, actor).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(seats_left(&store, train.id, TravelClass::TwoAc).await, 40);

        let err = service.release(booking.id, actor).await.unwrap_err();
        assert!(matches!(err, ReservationError::AlreadyCancelled));
        assert_eq!(seats_left(&store, train.id, TravelClass::TwoAc).await, 40);
    }

    #[tokio::test]
    async fn lookup_by_unassigned_pnr_is_absent() {
        // Scenario D.
        let (_store, service, _train) = seeded(&[(TravelClass::Sleeper, 500, 10)]).await;
        assert!(service.lookup_by_pnr("4242424242").await.unwrap().is_none());
        // Malformed keys do not reach storage either.
        assert!(service.lookup_by_pnr("not-a-pnr").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lookup_by_pnr_needs_no_actor() {
        let (_store, service, train) = seeded(&[(TravelClass::Sleeper, 500, 10)]).await;
        let booking = service
            .reserve(
                Uuid::new_v4(),
                train.id,
                TravelClass::Sleeper,
                NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                passengers(1),
            )
            .await
            .unwrap();

        let found = service.lookup_by_pnr(&booking.pnr).await.unwrap().unwrap();
        assert_eq!(found.id, booking.id);
    }

    #[tokio::test]
    async fn unknown_class_and_missing_train_fail_cleanly() {
        let (_store, service, train) = seeded(&[(TravelClass::Sleeper, 500, 10)]).await;
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        let err = service
            .reserve(Uuid::new_v4(), train.id, TravelClass::OneAc, date, passengers(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ReservationError::UnknownClass(_)));

        let err = service
            .reserve(Uuid::new_v4(), Uuid::new_v4(), TravelClass::Sleeper, date, passengers(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ReservationError::TrainNotFound));
    }

    #[tokio::test]
    async fn inactive_train_is_not_reservable_but_still_releasable() {
        let (store, service, train) = seeded(&[(TravelClass::Sleeper, 500, 10)]).await;
        let actor = owner();
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        let booking = service
            .reserve(actor.user_id, train.id, TravelClass::Sleeper, date, passengers(3))
            .await
            .unwrap();

        store.deactivate_train(train.id).await.unwrap();

        let err = service
            .reserve(actor.user_id, train.id, TravelClass::Sleeper, date, passengers(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ReservationError::TrainNotFound));

        // Cancellation still reaches the retired train's inventory.
        service.release(booking.id, actor).await.unwrap();
        assert_eq!(seats_left(&store, train.id, TravelClass::Sleeper).await, 10);
    }

    #[tokio::test]
    async fn empty_or_malformed_passengers_are_rejected() {
        let (_store, service, train) = seeded(&[(TravelClass::Sleeper, 500, 10)]).await;
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        let err = service
            .reserve(Uuid::new_v4(), train.id, TravelClass::Sleeper, date, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ReservationError::InvalidPassengers(_)));

        let bad_age = vec![crate::models::Passenger {
            name: "Meera".to_string(),
            age: 0,
            gender: Gender::Female,
            seat_number: None,
        }];
        let err = service
            .reserve(Uuid::new_v4(), train.id, TravelClass::Sleeper, date, bad_age)
            .await
            .unwrap_err();
        assert!(matches!(err, ReservationError::InvalidPassengers(_)));
    }

    #[tokio::test]
    async fn release_is_owner_or_admin_only() {
        let (_store, service, train) = seeded(&[(TravelClass::Sleeper, 500, 10)]).await;
        let actor = owner();
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        let booking = service
            .reserve(actor.user_id, train.id, TravelClass::Sleeper, date, passengers(1))
            .await
            .unwrap();

        let stranger = owner();
        let err = service.release(booking.id, stranger).await.unwrap_err();
        assert!(matches!(err, ReservationError::Forbidden));

        let admin = Actor {
            user_id: Uuid::new_v4(),
            is_admin: true,
        };
        service.release(booking.id, admin).await.unwrap();
    }

    #[tokio::test]
    async fn list_all_is_admin_only_and_recent_first() {
        let (_store, service, train) = seeded(&[(TravelClass::Sleeper, 500, 10)]).await;
        let actor = owner();
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        let first = service
            .reserve(actor.user_id, train.id, TravelClass::Sleeper, date, passengers(1))
            .await
            .unwrap();
        let second = service
            .reserve(actor.user_id, train.id, TravelClass::Sleeper, date, passengers(1))
            .await
            .unwrap();

        assert!(matches!(
            service.list_all(actor).await.unwrap_err(),
            ReservationError::Forbidden
        ));

        let admin = Actor {
            user_id: Uuid::new_v4(),
            is_admin: true,
        };
        let all = service.list_all(admin).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);

        let mine = service.list_by_owner(actor.user_id).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, second.id);
    }

    #[tokio::test]
    async fn pnrs_are_unique_across_the_ledger() {
        let (_store, service, train) = seeded(&[(TravelClass::General, 100, 200)]).await;
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            let booking = service
                .reserve(Uuid::new_v4(), train.id, TravelClass::General, date, passengers(1))
                .await
                .unwrap();
            assert!(railbook_core::pnr::is_well_formed(&booking.pnr));
            assert!(seen.insert(booking.pnr), "duplicate PNR issued");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reserves_never_oversell() {
        // Capacity invariant: combined passengers of successful reserves
        // never exceed the seats available at the start of the window.
        let (store, service, train) = seeded(&[(TravelClass::ThreeAc, 1500, 5)]).await;
        let service = Arc::new(service);
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            let train_id = train.id;
            handles.push(tokio::spawn(async move {
                service
                    .reserve(Uuid::new_v4(), train_id, TravelClass::ThreeAc, date, passengers(2))
                    .await
            }));
        }

        let mut sold = 0;
        for handle in handles {
            if let Ok(booking) = handle.await.unwrap() {
                sold += booking.seat_count();
            }
        }

        assert!(sold <= 5, "oversold: {sold} seats on a 5-seat class");
        let remaining = seats_left(&store, train.id, TravelClass::ThreeAc).await;
        assert_eq!(remaining, 5 - sold);
        assert!(remaining >= 0);
    }

    #[tokio::test]
    async fn conservation_over_reserve_and_release() {
        let (store, service, train) = seeded(&[(TravelClass::OneAc, 4500, 12)]).await;
        let actor = owner();
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        let booking = service
            .reserve(actor.user_id, train.id, TravelClass::OneAc, date, passengers(4))
            .await
            .unwrap();
        assert_eq!(seats_left(&store, train.id, TravelClass::OneAc).await, 8);

        service.release(booking.id, actor).await.unwrap();
        assert_eq!(seats_left(&store, train.id, TravelClass::OneAc).await, 12);
    }
}
