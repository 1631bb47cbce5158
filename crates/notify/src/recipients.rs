//! Recipient resolution: the requester-contact fallback chain and the
//! role-scoped recipient pools.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use mifugo_core::contact::{is_valid_email, normalize_phone};
use mifugo_core::domain::requisition::Requisition;
use mifugo_core::domain::user::UserRecord;
use mifugo_core::roles::Role;
use mifugo_db::repositories::UserDirectory;

/// Deduplicated contact pools for a set of role-holders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RolePool {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

pub struct RecipientResolver {
    users: Arc<dyn UserDirectory>,
}

impl RecipientResolver {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    /// Best-effort phone for the requester: the record's own contact
    /// aliases first, then the user-store fallback chain. Returns the
    /// normalized number.
    pub async fn requester_phone(&self, requisition: &Requisition) -> Option<String> {
        if let Some(normalized) = requisition.direct_phone().and_then(normalize_phone) {
            return Some(normalized);
        }

        let user = self.resolve_user(requisition).await?;
        user.best_phone().and_then(normalize_phone)
    }

    /// Best-effort email for the requester, same chain as
    /// [`requester_phone`](Self::requester_phone).
    pub async fn requester_email(&self, requisition: &Requisition) -> Option<String> {
        if let Some(email) =
            requisition.direct_email().filter(|email| is_valid_email(email))
        {
            return Some(email.to_string());
        }

        let user = self.resolve_user(requisition).await?;
        user.best_email().filter(|email| is_valid_email(email)).map(str::to_string)
    }

    /// Walk the user-store fallback chain, stopping at the first hit. Each
    /// step is skipped silently on a store error so a flaky lookup never
    /// takes the whole chain down.
    async fn resolve_user(&self, requisition: &Requisition) -> Option<UserRecord> {
        let requisition_id = requisition.id.0.as_str();

        // Point read by uid.
        if let Some(uid) = non_empty(&requisition.uid) {
            match self.users.find_by_key(uid).await {
                Ok(Some(user)) => return Some(user),
                Ok(None) => {}
                Err(error) => {
                    warn!(requisition_id, uid, error = %error, "user lookup by uid key failed");
                }
            }
        }

        // Point read by username (legacy key scheme).
        if let Some(username) = non_empty(&requisition.username) {
            match self.users.find_by_key(username).await {
                Ok(Some(user)) => return Some(user),
                Ok(None) => {}
                Err(error) => {
                    warn!(requisition_id, username, error = %error, "user lookup by username key failed");
                }
            }
        }

        // Indexed lookup where the uid child field matches (legacy records
        // whose store key is not the uid).
        if let Some(uid) = non_empty(&requisition.uid) {
            match self.users.find_by_uid(uid).await {
                Ok(Some(user)) => return Some(user),
                Ok(None) => {}
                Err(error) => {
                    warn!(requisition_id, uid, error = %error, "user lookup by uid field failed");
                }
            }
        }

        // Indexed lookup by each candidate email, retrying the lowercase
        // form when it differs.
        for email in requisition.email_candidates() {
            let lowercase = email.to_lowercase();
            let mut candidates = vec![email.to_string()];
            if lowercase != email {
                candidates.push(lowercase);
            }
            for candidate in candidates {
                match self.users.find_by_email(&candidate).await {
                    Ok(Some(user)) => return Some(user),
                    Ok(None) => {}
                    Err(error) => {
                        warn!(requisition_id, email = %candidate, error = %error, "user lookup by email failed");
                    }
                }
            }
        }

        None
    }

    /// Full directory scan for active role-holders permitted to act on the
    /// programme. Invalid contacts are dropped, not errors.
    pub async fn recipients_by_role(&self, roles: &[Role], programme: &str) -> RolePool {
        let users = match self.users.list_all().await {
            Ok(users) => users,
            Err(error) => {
                warn!(error = %error, "user directory scan failed; empty recipient pool");
                return RolePool::default();
            }
        };

        let mut pool = RolePool::default();
        let mut seen_emails = HashSet::new();
        let mut seen_phones = HashSet::new();

        for user in users {
            if user.is_inactive()
                || !user.has_any_role(roles)
                || !user.can_handle_programme(programme)
            {
                continue;
            }

            if let Some(email) = user.best_email().filter(|email| is_valid_email(email)) {
                if seen_emails.insert(email.to_ascii_lowercase()) {
                    pool.emails.push(email.to_string());
                }
            }
            if let Some(phone) = user.best_phone().and_then(normalize_phone) {
                if seen_phones.insert(phone.clone()) {
                    pool.phones.push(phone);
                }
            }
        }

        pool
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mifugo_core::domain::requisition::Requisition;
    use mifugo_core::domain::user::UserRecord;
    use mifugo_core::roles::Role;
    use mifugo_db::repositories::InMemoryUserDirectory;

    use super::RecipientResolver;

    async fn resolver_with(users: Vec<UserRecord>) -> RecipientResolver {
        let directory = InMemoryUserDirectory::default();
        directory.seed(users).await;
        RecipientResolver::new(Arc::new(directory))
    }

    #[tokio::test]
    async fn direct_record_phone_wins_over_the_directory() {
        let mut user = UserRecord::new("uid-1");
        user.phone_number = Some("0733999888".to_string());
        let resolver = resolver_with(vec![user]).await;

        let mut requisition = Requisition::new("REQ-1");
        requisition.uid = Some("uid-1".to_string());
        requisition.phone = Some("0712345678".to_string());

        assert_eq!(resolver.requester_phone(&requisition).await.as_deref(), Some("254712345678"));
    }

    #[tokio::test]
    async fn uid_key_lookup_resolves_the_directory_phone() {
        let mut user = UserRecord::new("uid-1");
        user.phone_number = Some("0733999888".to_string());
        let resolver = resolver_with(vec![user]).await;

        let mut requisition = Requisition::new("REQ-2");
        requisition.uid = Some("uid-1".to_string());

        assert_eq!(resolver.requester_phone(&requisition).await.as_deref(), Some("254733999888"));
    }

    #[tokio::test]
    async fn legacy_username_key_is_the_second_hop() {
        let mut user = UserRecord::new("wanjiru");
        user.mobile = Some("0712345678".to_string());
        let resolver = resolver_with(vec![user]).await;

        let mut requisition = Requisition::new("REQ-3");
        requisition.uid = Some("uid-unknown".to_string());
        requisition.username = Some("wanjiru".to_string());

        assert_eq!(resolver.requester_phone(&requisition).await.as_deref(), Some("254712345678"));
    }

    #[tokio::test]
    async fn uid_field_index_covers_records_keyed_by_username() {
        let mut user = UserRecord::new("wanjiru");
        user.uid = Some("auth-uid-9".to_string());
        user.phone = Some("0700111222".to_string());
        let resolver = resolver_with(vec![user]).await;

        let mut requisition = Requisition::new("REQ-4");
        requisition.uid = Some("auth-uid-9".to_string());

        assert_eq!(resolver.requester_phone(&requisition).await.as_deref(), Some("254700111222"));
    }

    #[tokio::test]
    async fn email_lookup_retries_the_lowercase_form() {
        let mut user = UserRecord::new("u-1");
        user.email = Some("jane@example.org".to_string());
        user.phone_number = Some("0712345678".to_string());
        let resolver = resolver_with(vec![user]).await;

        let mut requisition = Requisition::new("REQ-5");
        requisition.email = Some("JANE@EXAMPLE.ORG".to_string());

        // The record's own email is used for email resolution, but phone
        // resolution has to come from the matched directory record.
        assert_eq!(resolver.requester_phone(&requisition).await.as_deref(), Some("254712345678"));
    }

    #[tokio::test]
    async fn exhausted_chain_returns_none() {
        let resolver = resolver_with(vec![]).await;
        let requisition = Requisition::new("REQ-6");
        assert_eq!(resolver.requester_phone(&requisition).await, None);
        assert_eq!(resolver.requester_email(&requisition).await, None);
    }

    #[tokio::test]
    async fn role_pool_filters_inactive_and_unscoped_users() {
        let mut pm_kpmd = UserRecord::new("u-1");
        pm_kpmd.role = Some("Project Manager".to_string());
        pm_kpmd.allowed_programmes.insert("KPMD".to_string(), true);
        pm_kpmd.phone_number = Some("0712345678".to_string());

        let mut pm_other = UserRecord::new("u-2");
        pm_other.role = Some("Project Manager".to_string());
        pm_other.allowed_programmes.insert("RANGE".to_string(), true);
        pm_other.phone_number = Some("0722000111".to_string());

        let mut pm_inactive = UserRecord::new("u-3");
        pm_inactive.role = Some("Project Manager".to_string());
        pm_inactive.status = Some("inactive".to_string());
        pm_inactive.phone_number = Some("0733000111".to_string());

        let mut pm_unrestricted = UserRecord::new("u-4");
        pm_unrestricted.role = Some("project manger".to_string());
        pm_unrestricted.phone_number = Some("0744000111".to_string());

        let resolver =
            resolver_with(vec![pm_kpmd, pm_other, pm_inactive, pm_unrestricted]).await;
        let pool = resolver.recipients_by_role(&[Role::ProjectManager], "KPMD").await;

        assert_eq!(pool.phones, vec!["254712345678", "254744000111"]);
        assert!(pool.emails.is_empty());
    }

    #[tokio::test]
    async fn role_pool_deduplicates_contacts() {
        let mut hr_a = UserRecord::new("u-1");
        hr_a.role = Some("HR".to_string());
        hr_a.email = Some("hr@example.org".to_string());

        let mut hr_b = UserRecord::new("u-2");
        hr_b.role = Some("Human Resources".to_string());
        hr_b.email = Some("HR@example.org".to_string());

        let resolver = resolver_with(vec![hr_a, hr_b]).await;
        let pool = resolver.recipients_by_role(&[Role::Hr], "KPMD").await;

        assert_eq!(pool.emails, vec!["hr@example.org"]);
    }

    #[tokio::test]
    async fn missing_programme_only_reaches_unrestricted_users() {
        let mut scoped = UserRecord::new("u-1");
        scoped.role = Some("Finance".to_string());
        scoped.allowed_programmes.insert("KPMD".to_string(), true);
        scoped.email = Some("scoped@example.org".to_string());

        let mut unrestricted = UserRecord::new("u-2");
        unrestricted.role = Some("Finance".to_string());
        unrestricted.email = Some("open@example.org".to_string());

        let resolver = resolver_with(vec![scoped, unrestricted]).await;
        let pool = resolver.recipients_by_role(&[Role::Finance], "").await;

        assert_eq!(pool.emails, vec!["open@example.org"]);
    }
}
