pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod train_repo;
pub mod user_repo;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use train_repo::PgTrainRepository;
pub use user_repo::PgUserRepository;
