use crate::models::Booking;
use crate::repository::{BookingRepository, CommitOutcome, ReleaseOutcome};
use async_trait::async_trait;
use railbook_catalog::{Train, TrainRepository};
use railbook_core::search::TrainSearchQuery;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    trains: HashMap<Uuid, Train>,
    bookings: HashMap<Uuid, Booking>,
}

/// In-memory catalog + ledger behind a single mutex. Every reservation
/// transaction runs under the lock, so the atomicity contract of the
/// repository traits holds trivially. Used by service and API tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrainRepository for MemoryStore {
    async fn create_train(
        &self,
        train: &Train,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.inner.lock().await;
        if inner.trains.values().any(|t| t.number == train.number) {
            return Err(Box::new(railbook_catalog::train::CatalogError::DuplicateNumber(
                train.number.clone(),
            )));
        }
        inner.trains.insert(train.id, train.clone());
        Ok(())
    }

    async fn get_train(
        &self,
        id: Uuid,
    ) -> Result<Option<Train>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.inner.lock().await.trains.get(&id).cloned())
    }

    async fn list_active(
        &self,
    ) -> Result<Vec<Train>, Box<dyn std::error::Error + Send + Sync>> {
        let inner = self.inner.lock().await;
        let mut trains: Vec<Train> = inner
            .trains
            .values()
            .filter(|t| t.is_active)
            .cloned()
            .collect();
        trains.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(trains)
    }

    async fn search_trains(
        &self,
        query: &TrainSearchQuery,
    ) -> Result<Vec<Train>, Box<dyn std::error::Error + Send + Sync>> {
        let matches = |t: &Train| {
            let field = |filter: &Option<String>, value: &str| {
                filter.as_deref().map_or(true, |f| f == value)
            };
            t.is_active
                && field(&query.from_state, &t.from.state)
                && field(&query.from_district, &t.from.district)
                && field(&query.to_state, &t.to.state)
                && field(&query.to_district, &t.to.district)
                && query.running_day().map_or(true, |day| t.runs_on(day))
        };
        let inner = self.inner.lock().await;
        let mut trains: Vec<Train> = inner.trains.values().filter(|t| matches(t)).cloned().collect();
        trains.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(trains)
    }

    async fn update_train(
        &self,
        train: &Train,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.inner.lock().await;
        if !inner.trains.contains_key(&train.id) {
            return Ok(false);
        }
        inner.trains.insert(train.id, train.clone());
        Ok(true)
    }

    async fn deactivate_train(
        &self,
        id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.inner.lock().await;
        match inner.trains.get_mut(&id) {
            Some(train) => {
                train.deactivate();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn commit_reservation(
        &self,
        booking: &Booking,
    ) -> Result<CommitOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.inner.lock().await;

        if inner.bookings.values().any(|b| b.pnr == booking.pnr) {
            return Ok(CommitOutcome::DuplicatePnr);
        }

        let requested = booking.seat_count();
        let Some(train) = inner.trains.get_mut(&booking.train.train_id) else {
            return Ok(CommitOutcome::TrainMissing);
        };
        let Some(row) = train
            .classes
            .iter_mut()
            .find(|row| row.class == booking.class)
        else {
            return Ok(CommitOutcome::ClassMissing);
        };
        if row.seats_available < requested {
            return Ok(CommitOutcome::InsufficientSeats {
                available: row.seats_available,
            });
        }

        row.seats_available -= requested;
        inner.bookings.insert(booking.id, booking.clone());
        Ok(CommitOutcome::Committed)
    }

    async fn release_reservation(
        &self,
        booking_id: Uuid,
    ) -> Result<ReleaseOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut inner = self.inner.lock().await;

        let (train_id, class, seats) = match inner.bookings.get_mut(&booking_id) {
            None => return Ok(ReleaseOutcome::NotFound),
            Some(booking) => {
                if !booking.cancel() {
                    return Ok(ReleaseOutcome::AlreadyCancelled);
                }
                (booking.train.train_id, booking.class, booking.seat_count())
            }
        };

        let seats_restored = inner
            .trains
            .get_mut(&train_id)
            .and_then(|train| train.classes.iter_mut().find(|row| row.class == class))
            .map(|row| {
                row.seats_available += seats;
            })
            .is_some();

        Ok(ReleaseOutcome::Released { seats_restored })
    }

    async fn get_booking(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.inner.lock().await.bookings.get(&id).cloned())
    }

    async fn find_by_pnr(
        &self,
        pnr: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .inner
            .lock()
            .await
            .bookings
            .values()
            .find(|b| b.pnr == pnr)
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let inner = self.inner.lock().await;
        let mut bookings: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));
        Ok(bookings)
    }

    async fn list_all(
        &self,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let inner = self.inner.lock().await;
        let mut bookings: Vec<Booking> = inner.bookings.values().cloned().collect();
        bookings.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));
        Ok(bookings)
    }
}
