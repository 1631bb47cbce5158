use std::collections::HashMap;

use tokio::sync::RwLock;

use mifugo_core::domain::requisition::{Requisition, RequisitionId};
use mifugo_core::domain::user::UserRecord;

use super::{RepositoryError, RequisitionRepository, UserDirectory};

#[derive(Default)]
pub struct InMemoryRequisitionRepository {
    requisitions: RwLock<HashMap<String, Requisition>>,
}

impl InMemoryRequisitionRepository {
    pub async fn seed(&self, requisitions: Vec<Requisition>) {
        let mut store = self.requisitions.write().await;
        for requisition in requisitions {
            store.insert(requisition.id.0.clone(), requisition);
        }
    }
}

#[async_trait::async_trait]
impl RequisitionRepository for InMemoryRequisitionRepository {
    async fn find_by_id(&self, id: &RequisitionId) -> Result<Option<Requisition>, RepositoryError> {
        let requisitions = self.requisitions.read().await;
        Ok(requisitions.get(&id.0).cloned())
    }

    async fn save(&self, requisition: Requisition) -> Result<(), RepositoryError> {
        let mut requisitions = self.requisitions.write().await;
        requisitions.insert(requisition.id.0.clone(), requisition);
        Ok(())
    }

    async fn list_by_status(&self, status: &str) -> Result<Vec<Requisition>, RepositoryError> {
        let requisitions = self.requisitions.read().await;
        let mut matching: Vec<Requisition> =
            requisitions.values().filter(|r| r.status == status).cloned().collect();
        matching.sort_by(|left, right| left.id.0.cmp(&right.id.0));
        Ok(matching)
    }
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub async fn seed(&self, users: Vec<UserRecord>) {
        let mut store = self.users.write().await;
        for user in users {
            store.insert(user.key.clone(), user);
        }
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_key(&self, key: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(key).cloned())
    }

    async fn find_by_uid(&self, uid: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let users = self.users.read().await;
        let mut matching: Vec<&UserRecord> =
            users.values().filter(|user| user.uid.as_deref() == Some(uid)).collect();
        matching.sort_by(|left, right| left.key.cmp(&right.key));
        Ok(matching.first().map(|user| (*user).clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let users = self.users.read().await;
        let mut matching: Vec<&UserRecord> =
            users.values().filter(|user| user.email.as_deref() == Some(email)).collect();
        matching.sort_by(|left, right| left.key.cmp(&right.key));
        Ok(matching.first().map(|user| (*user).clone()))
    }

    async fn list_all(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        let users = self.users.read().await;
        let mut all: Vec<UserRecord> = users.values().cloned().collect();
        all.sort_by(|left, right| left.key.cmp(&right.key));
        Ok(all)
    }
}
