//! Database repository for explicitly added categories.
//!
//! Only names a user added (or imported) are stored here. The full category set shown to clients is
//! the merge of these, the configured defaults and the categories observed on expense rows; see
//! [`crate::ledger::merge_categories`].
//!
//! Names come back in the order they were added; `replace_all` stores them in the order given.

use crate::db::{errors::Result, models::categories::CategoryDBResponse};
use crate::types::{UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow, SqliteConnection};
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct Category {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryDBResponse {
    fn from(category: Category) -> Self {
        Self {
            name: category.name,
            created_at: category.created_at,
        }
    }
}

pub struct Categories<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Categories<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(owner = %abbrev_uuid(&owner)), err)]
    pub async fn list(&mut self, owner: UserId) -> Result<Vec<CategoryDBResponse>> {
        let rows = sqlx::query_as::<_, Category>("SELECT name, created_at FROM categories WHERE user_id = ?1 ORDER BY position, created_at, name")
            .bind(owner)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(owner = %abbrev_uuid(&owner)), err)]
    pub async fn list_names(&mut self, owner: UserId) -> Result<Vec<String>> {
        Ok(self.list(owner).await?.into_iter().map(|c| c.name).collect())
    }

    /// Returns `false` if the name was already stored.
    #[instrument(skip(self), fields(owner = %abbrev_uuid(&owner)), err)]
    pub async fn add(&mut self, owner: UserId, name: &str) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO categories (user_id, name, created_at, position)
             VALUES (?1, ?2, ?3, (SELECT COALESCE(MAX(position), -1) + 1 FROM categories WHERE user_id = ?1))
             ON CONFLICT (user_id, name) DO NOTHING",
        )
        .bind(owner)
        .bind(name)
        .bind(Utc::now())
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(owner = %abbrev_uuid(&owner)), err)]
    pub async fn remove(&mut self, owner: UserId, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE user_id = ?1 AND name = ?2")
            .bind(owner)
            .bind(name)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace the stored names with `names`. Duplicates in the input are collapsed.
    #[instrument(skip(self, names), fields(owner = %abbrev_uuid(&owner), count = names.len()), err)]
    pub async fn replace_all(&mut self, owner: UserId, names: &[String]) -> Result<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM categories WHERE user_id = ?1")
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        for (position, name) in names.iter().enumerate() {
            sqlx::query(
                "INSERT INTO categories (user_id, name, created_at, position) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, name) DO NOTHING",
            )
            .bind(owner)
            .bind(name)
            .bind(now)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
