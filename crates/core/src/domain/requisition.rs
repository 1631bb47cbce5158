use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequisitionId(pub String);

/// Canonical view of the free-form `status` column. External writers own
/// the stored value, so parsing is case-insensitive and unknown spellings
/// collapse to `Unknown` instead of failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequisitionStatus {
    Pending,
    Approved,
    Rejected,
    Complete,
    Unknown,
}

impl RequisitionStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "draft" | "pending" => Self::Pending,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            "complete" | "completed" => Self::Complete,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Complete => "complete",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub entry_id: String,
    pub action: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub details: Option<String>,
}

impl HistoryEntry {
    pub fn new(action: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            entry_id: Uuid::new_v4().to_string(),
            action: action.into(),
            actor: actor.into(),
            timestamp: Utc::now(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// A funds/resource request moving through the approval lifecycle
/// `pending -> approved -> (authorized) -> complete`, divertible to
/// `rejected` from `pending`/`approved`. Contact and identity fields are
/// aliases accumulated over the dashboard's lifetime; accessors below
/// encode the fixed priority order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Requisition {
    pub id: RequisitionId,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub requester_email: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub programme: Option<String>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub fuel_amount: Option<f64>,
    #[serde(default)]
    pub trip_purpose: Option<String>,
    #[serde(default)]
    pub fuel_purpose: Option<String>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub approved_at: Option<String>,
    #[serde(default)]
    pub authorized_by: Option<String>,
    #[serde(default)]
    pub completed_by: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub rejected_by: Option<String>,
    #[serde(default)]
    pub rejected_at: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub rejection_sms_text: Option<String>,
    #[serde(default)]
    pub hr_auto_rejected: bool,
    #[serde(default)]
    pub hr_auto_rejected_at: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Requisition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RequisitionId(id.into()),
            status: "pending".to_string(),
            kind: None,
            uid: None,
            name: None,
            username: None,
            email: None,
            requester_email: None,
            user_email: None,
            phone: None,
            phone_number: None,
            mobile: None,
            telephone: None,
            contact: None,
            programme: None,
            total: None,
            fuel_amount: None,
            trip_purpose: None,
            fuel_purpose: None,
            approved_by: None,
            approved_at: None,
            authorized_by: None,
            completed_by: None,
            completed_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            rejection_sms_text: None,
            hr_auto_rejected: false,
            hr_auto_rejected_at: None,
            history: Vec::new(),
        }
    }

    pub fn status_tag(&self) -> RequisitionStatus {
        RequisitionStatus::parse(&self.status)
    }

    /// `authorized` is inferred from the actor field, not from a dedicated
    /// status value.
    pub fn is_authorized(&self) -> bool {
        self.authorized_by.as_deref().is_some_and(|by| !by.trim().is_empty())
    }

    /// First non-empty phone alias, in fixed priority order.
    pub fn direct_phone(&self) -> Option<&str> {
        [&self.phone, &self.phone_number, &self.mobile, &self.telephone, &self.contact]
            .into_iter()
            .find_map(|field| field.as_deref().map(str::trim).filter(|value| !value.is_empty()))
    }

    /// First non-empty email alias, in fixed priority order.
    pub fn direct_email(&self) -> Option<&str> {
        [&self.email, &self.requester_email, &self.user_email]
            .into_iter()
            .find_map(|field| field.as_deref().map(str::trim).filter(|value| !value.is_empty()))
    }

    /// All candidate email fields, for indexed user-store lookups.
    pub fn email_candidates(&self) -> Vec<&str> {
        [&self.email, &self.requester_email, &self.user_email]
            .into_iter()
            .filter_map(|field| field.as_deref().map(str::trim).filter(|value| !value.is_empty()))
            .collect()
    }

    pub fn requester_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or("Requester")
    }

    /// First non-null of `total` / `fuel_amount`.
    pub fn amount(&self) -> Option<f64> {
        self.total.or(self.fuel_amount)
    }

    /// The literal kind `fuel` reads the fuel purpose; everything else the
    /// trip purpose.
    pub fn purpose(&self) -> Option<&str> {
        let is_fuel =
            self.kind.as_deref().is_some_and(|kind| kind.trim().eq_ignore_ascii_case("fuel"));
        let field = if is_fuel { &self.fuel_purpose } else { &self.trip_purpose };
        field.as_deref().map(str::trim).filter(|value| !value.is_empty())
    }

    pub fn append_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }
}
