use railbook_booking::{BookingRepository, ReservationService};
use railbook_catalog::TrainRepository;
use railbook_core::identity::UserRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub trains: Arc<dyn TrainRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub users: Arc<dyn UserRepository>,
    pub reservations: Arc<ReservationService>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        trains: Arc<dyn TrainRepository>,
        bookings: Arc<dyn BookingRepository>,
        users: Arc<dyn UserRepository>,
        auth: AuthConfig,
    ) -> Self {
        let reservations = Arc::new(ReservationService::new(trains.clone(), bookings.clone()));
        Self {
            trains,
            bookings,
            users,
            reservations,
            auth,
        }
    }
}
