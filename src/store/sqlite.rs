use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use super::{new_id, Collection, DocumentStore, StoreError};
use crate::models::{
    Checklist, ChecklistFields, ChecklistItem, ChecklistPatch, ItemFields, NewUser, User,
};

/// Initialize the database connection pool and run migrations
pub async fn init_db(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Current time at the precision timestamps are persisted with, so returned
/// records compare equal to what a later read yields.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{}': {}", raw, e)))
}

// Row types for database queries
#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    phone: Option<String>,
    password_hash: String,
    created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            created_at: parse_timestamp(&row.created_at)?,
            id: row.id,
            email: row.email,
            name: row.name,
            phone: row.phone,
            password_hash: row.password_hash,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ChecklistRow {
    id: String,
    name: String,
    category: Option<String>,
    description: Option<String>,
    limit_date: Option<String>,
    change_color_by_date: bool,
    show_motivational_msg: bool,
    user_id: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ChecklistRow> for Checklist {
    type Error = StoreError;

    fn try_from(row: ChecklistRow) -> Result<Self, Self::Error> {
        let limit_date = row.limit_date.as_deref().map(parse_timestamp).transpose()?;
        Ok(Checklist {
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            limit_date,
            id: row.id,
            name: row.name,
            category: row.category,
            description: row.description,
            change_color_by_date: row.change_color_by_date,
            show_motivational_msg: row.show_motivational_msg,
            user_id: row.user_id,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    title: String,
    description: Option<String>,
    completed: bool,
    checklist_id: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ItemRow> for ChecklistItem {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(ChecklistItem {
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            id: row.id,
            title: row.title,
            description: row.description,
            completed: row.completed,
            checklist_id: row.checklist_id,
        })
    }
}

fn decode_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Document store backed by SQLite, one table per collection.
///
/// Every method issues a single write statement, so writes are atomic per
/// document and never span documents.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(init_db(path).await?))
    }

    async fn fetch_item(&self, id: &str) -> Result<Option<ChecklistItem>, StoreError> {
        let row: Option<ItemRow> = sqlx::query_as("SELECT * FROM checklist_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ChecklistItem::try_from).transpose()
    }

    async fn fetch_checklist(&self, id: &str) -> Result<Option<Checklist>, StoreError> {
        let row: Option<ChecklistRow> = sqlx::query_as("SELECT * FROM checklists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Checklist::try_from).transpose()
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let record = User {
            id: new_id(),
            email: user.email,
            name: user.name,
            phone: user.phone,
            password_hash: user.password_hash,
            created_at: now(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, name, phone, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.email)
        .bind(&record.name)
        .bind(&record.phone)
        .bind(&record.password_hash)
        .bind(timestamp(record.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(record),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Conflict(Collection::Users, record.email))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM users ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        decode_all(rows)
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_checklist(
        &self,
        owner_id: &str,
        fields: ChecklistFields,
    ) -> Result<Checklist, StoreError> {
        let now = now();
        let record = Checklist {
            id: new_id(),
            name: fields.name,
            category: fields.category,
            description: fields.description,
            limit_date: fields.limit_date.map(|dt| dt.trunc_subsecs(6)),
            change_color_by_date: fields.change_color_by_date,
            show_motivational_msg: fields.show_motivational_msg,
            user_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO checklists (id, name, category, description, limit_date,
                change_color_by_date, show_motivational_msg, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.category)
        .bind(&record.description)
        .bind(record.limit_date.map(timestamp))
        .bind(record.change_color_by_date)
        .bind(record.show_motivational_msg)
        .bind(&record.user_id)
        .bind(timestamp(record.created_at))
        .bind(timestamp(record.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_checklist(&self, id: &str) -> Result<Option<Checklist>, StoreError> {
        self.fetch_checklist(id).await
    }

    async fn list_checklists_by_owner(&self, owner_id: &str) -> Result<Vec<Checklist>, StoreError> {
        let rows: Vec<ChecklistRow> =
            sqlx::query_as("SELECT * FROM checklists WHERE user_id = ? ORDER BY rowid")
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?;
        decode_all(rows)
    }

    async fn update_checklist(
        &self,
        id: &str,
        patch: &ChecklistPatch,
    ) -> Result<Checklist, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE checklists
            SET name = COALESCE(?, name),
                category = COALESCE(?, category),
                description = COALESCE(?, description),
                limit_date = COALESCE(?, limit_date),
                change_color_by_date = COALESCE(?, change_color_by_date),
                show_motivational_msg = COALESCE(?, show_motivational_msg),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&patch.name)
        .bind(&patch.category)
        .bind(&patch.description)
        .bind(patch.limit_date.map(timestamp))
        .bind(patch.change_color_by_date)
        .bind(patch.show_motivational_msg)
        .bind(timestamp(now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(Collection::Checklists, id.to_string()));
        }

        self.fetch_checklist(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(Collection::Checklists, id.to_string()))
    }

    async fn delete_checklist(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM checklists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn item_ids_by_checklist(&self, checklist_id: &str) -> Result<Vec<String>, StoreError> {
        let ids: Vec<(String,)> =
            sqlx::query_as("SELECT id FROM checklist_items WHERE checklist_id = ? ORDER BY rowid")
                .bind(checklist_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn list_items_by_checklist(
        &self,
        checklist_id: &str,
    ) -> Result<Vec<ChecklistItem>, StoreError> {
        let rows: Vec<ItemRow> =
            sqlx::query_as("SELECT * FROM checklist_items WHERE checklist_id = ? ORDER BY rowid")
                .bind(checklist_id)
                .fetch_all(&self.pool)
                .await?;
        decode_all(rows)
    }

    async fn get_item(&self, id: &str) -> Result<Option<ChecklistItem>, StoreError> {
        self.fetch_item(id).await
    }

    async fn create_item(&self, fields: &ItemFields) -> Result<ChecklistItem, StoreError> {
        let now = now();
        let record = ChecklistItem {
            id: new_id(),
            title: fields.title.clone(),
            description: fields.description.clone(),
            completed: fields.completed,
            checklist_id: fields.checklist_id.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO checklist_items (id, title, description, completed, checklist_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.completed)
        .bind(&record.checklist_id)
        .bind(timestamp(record.created_at))
        .bind(timestamp(record.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_item(
        &self,
        id: &str,
        fields: &ItemFields,
    ) -> Result<ChecklistItem, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE checklist_items
            SET title = ?, description = ?, completed = ?, checklist_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.completed)
        .bind(&fields.checklist_id)
        .bind(timestamp(now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(Collection::ChecklistItems, id.to_string()));
        }

        self.fetch_item(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(Collection::ChecklistItems, id.to_string()))
    }

    async fn delete_item(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM checklist_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
