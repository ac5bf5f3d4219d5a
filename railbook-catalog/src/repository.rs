use crate::train::Train;
use async_trait::async_trait;
use railbook_core::search::TrainSearchQuery;
use uuid::Uuid;

/// Repository trait for catalog access. Seat counters are read through here
/// but only ever mutated by the booking ledger's reservation transactions.
#[async_trait]
pub trait TrainRepository: Send + Sync {
    async fn create_train(
        &self,
        train: &Train,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_train(
        &self,
        id: Uuid,
    ) -> Result<Option<Train>, Box<dyn std::error::Error + Send + Sync>>;

    /// Active trains only.
    async fn list_active(
        &self,
    ) -> Result<Vec<Train>, Box<dyn std::error::Error + Send + Sync>>;

    /// Active trains matching the query's endpoint filters and running day.
    async fn search_trains(
        &self,
        query: &TrainSearchQuery,
    ) -> Result<Vec<Train>, Box<dyn std::error::Error + Send + Sync>>;

    /// Replace the stored record. Returns false if the train does not exist.
    async fn update_train(
        &self,
        train: &Train,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    /// Soft delete. Returns false if the train does not exist.
    async fn deactivate_train(
        &self,
        id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
