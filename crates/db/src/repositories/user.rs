use std::collections::BTreeMap;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use mifugo_core::domain::user::UserRecord;

use super::{RepositoryError, UserDirectory};
use crate::DbPool;

pub struct SqlUserDirectory {
    pool: DbPool,
}

impl SqlUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "key, uid, name, username, role, designation, department, status,
        allowed_programmes, email, phone, phone_number, mobile";

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_user(row: &SqliteRow) -> Result<UserRecord, RepositoryError> {
    let programmes_raw: String = column(row, "allowed_programmes")?;
    let allowed_programmes: BTreeMap<String, bool> = serde_json::from_str(&programmes_raw)
        .map_err(|e| RepositoryError::Decode(format!("allowed_programmes column: {e}")))?;

    Ok(UserRecord {
        key: column(row, "key")?,
        uid: column(row, "uid")?,
        name: column(row, "name")?,
        username: column(row, "username")?,
        role: column(row, "role")?,
        designation: column(row, "designation")?,
        department: column(row, "department")?,
        status: column(row, "status")?,
        allowed_programmes,
        email: column(row, "email")?,
        phone: column(row, "phone")?,
        phone_number: column(row, "phone_number")?,
        mobile: column(row, "mobile")?,
    })
}

#[async_trait::async_trait]
impl UserDirectory for SqlUserDirectory {
    async fn find_by_key(&self, key: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM users WHERE key = ?"))
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_user(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_uid(&self, uid: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM users WHERE uid = ? ORDER BY key LIMIT 1"
        ))
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_user(r)?)),
            None => Ok(None),
        }
    }

    /// Exact equality, mirroring the store's child-indexed query; callers
    /// retry with the lowercase form themselves.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM users WHERE email = ? ORDER BY key LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_user(r)?)),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        let rows: Vec<SqliteRow> =
            sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM users ORDER BY key"))
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_user).collect::<Result<Vec<_>, _>>()
    }
}

/// Test seeding helper; production rows arrive through the external
/// directory sync.
pub async fn insert_user(pool: &DbPool, user: &UserRecord) -> Result<(), RepositoryError> {
    let allowed_programmes = serde_json::to_string(&user.allowed_programmes)
        .map_err(|e| RepositoryError::Decode(format!("allowed_programmes column: {e}")))?;

    sqlx::query(
        "INSERT INTO users (key, uid, name, username, role, designation, department, status,
             allowed_programmes, email, phone, phone_number, mobile)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET
             uid = excluded.uid,
             name = excluded.name,
             username = excluded.username,
             role = excluded.role,
             designation = excluded.designation,
             department = excluded.department,
             status = excluded.status,
             allowed_programmes = excluded.allowed_programmes,
             email = excluded.email,
             phone = excluded.phone,
             phone_number = excluded.phone_number,
             mobile = excluded.mobile",
    )
    .bind(&user.key)
    .bind(&user.uid)
    .bind(&user.name)
    .bind(&user.username)
    .bind(&user.role)
    .bind(&user.designation)
    .bind(&user.department)
    .bind(&user.status)
    .bind(&allowed_programmes)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.phone_number)
    .bind(&user.mobile)
    .execute(pool)
    .await?;

    Ok(())
}
