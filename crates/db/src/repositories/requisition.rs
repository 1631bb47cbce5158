use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use mifugo_core::domain::requisition::{HistoryEntry, Requisition, RequisitionId};

use super::{RepositoryError, RequisitionRepository};
use crate::DbPool;

pub struct SqlRequisitionRepository {
    pool: DbPool,
}

impl SqlRequisitionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, status, kind, uid, name, username, email, requester_email,
        user_email, phone, phone_number, mobile, telephone, contact, programme,
        total, fuel_amount, trip_purpose, fuel_purpose, approved_by, approved_at,
        authorized_by, completed_by, completed_at, rejected_by, rejected_at,
        rejection_reason, rejection_sms_text, hr_auto_rejected, hr_auto_rejected_at, history";

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_requisition(row: &SqliteRow) -> Result<Requisition, RepositoryError> {
    let history_raw: String = column(row, "history")?;
    let history: Vec<HistoryEntry> = serde_json::from_str(&history_raw)
        .map_err(|e| RepositoryError::Decode(format!("history column: {e}")))?;
    let hr_auto_rejected: i64 = column(row, "hr_auto_rejected")?;

    Ok(Requisition {
        id: RequisitionId(column(row, "id")?),
        status: column(row, "status")?,
        kind: column(row, "kind")?,
        uid: column(row, "uid")?,
        name: column(row, "name")?,
        username: column(row, "username")?,
        email: column(row, "email")?,
        requester_email: column(row, "requester_email")?,
        user_email: column(row, "user_email")?,
        phone: column(row, "phone")?,
        phone_number: column(row, "phone_number")?,
        mobile: column(row, "mobile")?,
        telephone: column(row, "telephone")?,
        contact: column(row, "contact")?,
        programme: column(row, "programme")?,
        total: column(row, "total")?,
        fuel_amount: column(row, "fuel_amount")?,
        trip_purpose: column(row, "trip_purpose")?,
        fuel_purpose: column(row, "fuel_purpose")?,
        approved_by: column(row, "approved_by")?,
        approved_at: column(row, "approved_at")?,
        authorized_by: column(row, "authorized_by")?,
        completed_by: column(row, "completed_by")?,
        completed_at: column(row, "completed_at")?,
        rejected_by: column(row, "rejected_by")?,
        rejected_at: column(row, "rejected_at")?,
        rejection_reason: column(row, "rejection_reason")?,
        rejection_sms_text: column(row, "rejection_sms_text")?,
        hr_auto_rejected: hr_auto_rejected != 0,
        hr_auto_rejected_at: column(row, "hr_auto_rejected_at")?,
        history,
    })
}

#[async_trait::async_trait]
impl RequisitionRepository for SqlRequisitionRepository {
    async fn find_by_id(&self, id: &RequisitionId) -> Result<Option<Requisition>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM requisitions WHERE id = ?"
        ))
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_requisition(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, requisition: Requisition) -> Result<(), RepositoryError> {
        let history = serde_json::to_string(&requisition.history)
            .map_err(|e| RepositoryError::Decode(format!("history column: {e}")))?;

        sqlx::query(
            "INSERT INTO requisitions (id, status, kind, uid, name, username, email,
                 requester_email, user_email, phone, phone_number, mobile, telephone,
                 contact, programme, total, fuel_amount, trip_purpose, fuel_purpose,
                 approved_by, approved_at, authorized_by, completed_by, completed_at,
                 rejected_by, rejected_at, rejection_reason, rejection_sms_text,
                 hr_auto_rejected, hr_auto_rejected_at, history)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 status = excluded.status,
                 kind = excluded.kind,
                 uid = excluded.uid,
                 name = excluded.name,
                 username = excluded.username,
                 email = excluded.email,
                 requester_email = excluded.requester_email,
                 user_email = excluded.user_email,
                 phone = excluded.phone,
                 phone_number = excluded.phone_number,
                 mobile = excluded.mobile,
                 telephone = excluded.telephone,
                 contact = excluded.contact,
                 programme = excluded.programme,
                 total = excluded.total,
                 fuel_amount = excluded.fuel_amount,
                 trip_purpose = excluded.trip_purpose,
                 fuel_purpose = excluded.fuel_purpose,
                 approved_by = excluded.approved_by,
                 approved_at = excluded.approved_at,
                 authorized_by = excluded.authorized_by,
                 completed_by = excluded.completed_by,
                 completed_at = excluded.completed_at,
                 rejected_by = excluded.rejected_by,
                 rejected_at = excluded.rejected_at,
                 rejection_reason = excluded.rejection_reason,
                 rejection_sms_text = excluded.rejection_sms_text,
                 hr_auto_rejected = excluded.hr_auto_rejected,
                 hr_auto_rejected_at = excluded.hr_auto_rejected_at,
                 history = excluded.history",
        )
        .bind(&requisition.id.0)
        .bind(&requisition.status)
        .bind(&requisition.kind)
        .bind(&requisition.uid)
        .bind(&requisition.name)
        .bind(&requisition.username)
        .bind(&requisition.email)
        .bind(&requisition.requester_email)
        .bind(&requisition.user_email)
        .bind(&requisition.phone)
        .bind(&requisition.phone_number)
        .bind(&requisition.mobile)
        .bind(&requisition.telephone)
        .bind(&requisition.contact)
        .bind(&requisition.programme)
        .bind(requisition.total)
        .bind(requisition.fuel_amount)
        .bind(&requisition.trip_purpose)
        .bind(&requisition.fuel_purpose)
        .bind(&requisition.approved_by)
        .bind(&requisition.approved_at)
        .bind(&requisition.authorized_by)
        .bind(&requisition.completed_by)
        .bind(&requisition.completed_at)
        .bind(&requisition.rejected_by)
        .bind(&requisition.rejected_at)
        .bind(&requisition.rejection_reason)
        .bind(&requisition.rejection_sms_text)
        .bind(i64::from(requisition.hr_auto_rejected))
        .bind(&requisition.hr_auto_rejected_at)
        .bind(&history)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_by_status(&self, status: &str) -> Result<Vec<Requisition>, RepositoryError> {
        let rows: Vec<SqliteRow> = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM requisitions WHERE status = ? ORDER BY id"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_requisition).collect::<Result<Vec<_>, _>>()
    }
}
