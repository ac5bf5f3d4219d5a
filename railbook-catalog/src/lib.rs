pub mod repository;
pub mod train;

pub use repository::TrainRepository;
pub use train::{ClassRow, RouteEndpoint, Train, TravelClass};
