use async_trait::async_trait;
use thiserror::Error;

use mifugo_core::domain::requisition::{Requisition, RequisitionId};
use mifugo_core::domain::user::UserRecord;

pub mod memory;
pub mod requisition;
pub mod user;

pub use memory::{InMemoryRequisitionRepository, InMemoryUserDirectory};
pub use requisition::SqlRequisitionRepository;
pub use user::SqlUserDirectory;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait RequisitionRepository: Send + Sync {
    async fn find_by_id(&self, id: &RequisitionId) -> Result<Option<Requisition>, RepositoryError>;
    async fn save(&self, requisition: Requisition) -> Result<(), RepositoryError>;
    /// Exact-equality status scan, mirroring the store's child-indexed
    /// query. Status values are written lowercase by every internal writer.
    async fn list_by_status(&self, status: &str) -> Result<Vec<Requisition>, RepositoryError>;
}

/// Read-only view of the externally-owned user directory. Point reads by
/// store key plus the two child-indexed equality lookups the recipient
/// resolver depends on, and a full-table scan for role-based fan-out.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_key(&self, key: &str) -> Result<Option<UserRecord>, RepositoryError>;
    async fn find_by_uid(&self, uid: &str) -> Result<Option<UserRecord>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<UserRecord>, RepositoryError>;
}
