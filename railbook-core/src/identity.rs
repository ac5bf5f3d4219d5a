use crate::pii::Masked;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. Credential verification happens in an outer
/// authentication collaborator; this record only carries identity and the
/// admin privilege flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Masked<String>,
    pub phone: Option<Masked<String>>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email: Masked(email),
            phone: None,
            state: None,
            district: None,
            is_admin: false,
            created_at: Utc::now(),
        }
    }
}

/// Profile fields a user may change about themselves. Email and the admin
/// flag are not self-serviceable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
}

/// Repository trait for account storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(
        &self,
        user: &User,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_user(
        &self,
        id: Uuid,
    ) -> Result<Option<User>, Box<dyn std::error::Error + Send + Sync>>;

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<User>, Box<dyn std::error::Error + Send + Sync>>;

    async fn update_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, Box<dyn std::error::Error + Send + Sync>>;
}
