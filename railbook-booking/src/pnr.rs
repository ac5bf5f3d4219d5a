use crate::repository::BookingRepository;
use crate::service::ReservationError;
use railbook_core::pnr;
use std::sync::Arc;

/// How many candidate PNRs to try before giving up. With ~9 billion values
/// in the range, hitting this means the random source is broken, not that
/// the ledger is full.
const MAX_ATTEMPTS: usize = 5;

/// Draws PNR candidates and checks them against the ledger before they are
/// committed. The unique index on the ledger remains the authority; a
/// concurrent insert between check and commit surfaces as a DuplicatePnr
/// commit outcome and re-enters this allocator.
pub struct PnrAllocator {
    ledger: Arc<dyn BookingRepository>,
}

impl PnrAllocator {
    pub fn new(ledger: Arc<dyn BookingRepository>) -> Self {
        Self { ledger }
    }

    /// A PNR not currently present in the ledger.
    pub async fn allocate(&self) -> Result<String, ReservationError> {
        self.allocate_with(pnr::random_candidate).await
    }

    async fn allocate_with(
        &self,
        mut next_candidate: impl FnMut() -> String,
    ) -> Result<String, ReservationError> {
        for _ in 0..MAX_ATTEMPTS {
            let candidate = next_candidate();
            let taken = self
                .ledger
                .find_by_pnr(&candidate)
                .await
                .map_err(ReservationError::storage)?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
            tracing::debug!(pnr = %candidate, "PNR collision, redrawing");
        }
        Err(ReservationError::PnrExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::testing::{booking_on, sample_train};
    use railbook_catalog::{TrainRepository, TravelClass};

    async fn store_with_pnr(pnr: &str) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let train = sample_train(&[(TravelClass::Sleeper, 500, 10)]);
        store.create_train(&train).await.unwrap();
        let booking = booking_on(&train, TravelClass::Sleeper, 500, 1, pnr);
        store.commit_reservation(&booking).await.unwrap();
        store
    }

    #[tokio::test]
    async fn redraws_on_collision() {
        let store = store_with_pnr("1111111111").await;
        let allocator = PnrAllocator::new(store);
        let mut draws = ["1111111111", "2222222222"].iter();
        let pnr = allocator
            .allocate_with(|| draws.next().unwrap().to_string())
            .await
            .unwrap();
        assert_eq!(pnr, "2222222222");
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let store = store_with_pnr("1111111111").await;
        let allocator = PnrAllocator::new(store);
        let mut count = 0usize;
        let err = allocator
            .allocate_with(|| {
                count += 1;
                "1111111111".to_string()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ReservationError::PnrExhausted));
        assert_eq!(count, MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn random_allocation_is_well_formed() {
        let store = Arc::new(MemoryStore::new());
        let allocator = PnrAllocator::new(store);
        let pnr = allocator.allocate().await.unwrap();
        assert!(railbook_core::pnr::is_well_formed(&pnr));
    }
}
