//! Database repository for expense records.

use crate::db::{
    errors::{DbError, Result},
    handlers::{decode_amount, encode_amount, repository::Repository},
    models::expenses::{ExpenseCreateDBRequest, ExpenseDBResponse, ExpenseUpdateDBRequest},
};
use crate::types::{RecordKey, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow, SqliteConnection};
use tracing::instrument;

/// Filter for listing one user's expenses.
#[derive(Debug, Clone)]
pub struct ExpenseFilter {
    pub owner: UserId,
    pub category: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl ExpenseFilter {
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            category: None,
            from: None,
            to: None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct Expense {
    pub user_id: UserId,
    pub id: String,
    pub date: String,
    pub description: String,
    pub category: String,
    pub amount: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Expense> for ExpenseDBResponse {
    type Error = DbError;

    fn try_from(row: Expense) -> Result<Self> {
        Ok(Self {
            owner: row.user_id,
            id: row.id,
            date: row.date,
            description: row.description,
            category: row.category,
            amount: decode_amount(&row.amount)?,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct ExpenseRecords<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for ExpenseRecords<'c> {
    type CreateRequest = ExpenseCreateDBRequest;
    type UpdateRequest = ExpenseUpdateDBRequest;
    type Response = ExpenseDBResponse;
    type Id = RecordKey;
    type Filter = ExpenseFilter;

    #[instrument(skip(self, request), fields(record = %RecordKey::new(request.owner, request.id.clone()), category = %request.category), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        insert(&mut *self.db, request).await
    }

    #[instrument(skip(self), fields(record = %id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let row = sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE user_id = ?1 AND id = ?2")
            .bind(id.owner)
            .bind(&id.id)
            .fetch_optional(&mut *self.db)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self, filter), fields(owner = %abbrev_uuid(&filter.owner), category = ?filter.category), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let rows = sqlx::query_as::<_, Expense>(
            r#"
            SELECT * FROM expenses
            WHERE user_id = ?1
              AND (?2 IS NULL OR category = ?2)
              AND (?3 IS NULL OR date >= ?3)
              AND (?4 IS NULL OR date <= ?4)
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(filter.owner)
        .bind(&filter.category)
        .bind(&filter.from)
        .bind(&filter.to)
        .fetch_all(&mut *self.db)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self), fields(record = %id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE user_id = ?1 AND id = ?2")
            .bind(id.owner)
            .bind(&id.id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(record = %id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let row = sqlx::query_as::<_, Expense>(
            r#"
            UPDATE expenses SET
                date = ?3,
                description = ?4,
                category = ?5,
                amount = ?6,
                notes = ?7,
                updated_at = ?8
            WHERE user_id = ?1 AND id = ?2
            RETURNING *
            "#,
        )
        .bind(id.owner)
        .bind(&id.id)
        .bind(&request.date)
        .bind(&request.description)
        .bind(&request.category)
        .bind(encode_amount(&request.amount))
        .bind(&request.notes)
        .bind(Utc::now())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        row.try_into()
    }
}

async fn insert(conn: &mut SqliteConnection, request: &ExpenseCreateDBRequest) -> Result<ExpenseDBResponse> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, Expense>(
        r#"
        INSERT INTO expenses (user_id, id, date, description, category, amount, notes, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
        RETURNING *
        "#,
    )
    .bind(request.owner)
    .bind(&request.id)
    .bind(&request.date)
    .bind(&request.description)
    .bind(&request.category)
    .bind(encode_amount(&request.amount))
    .bind(&request.notes)
    .bind(now)
    .fetch_one(conn)
    .await?;

    row.try_into()
}

impl<'c> ExpenseRecords<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Distinct categories used on the owner's expense rows, sorted by name.
    #[instrument(skip(self), fields(owner = %abbrev_uuid(&owner)), err)]
    pub async fn observed_categories(&mut self, owner: UserId) -> Result<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>("SELECT DISTINCT category FROM expenses WHERE user_id = ?1 ORDER BY category")
            .bind(owner)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(categories)
    }

    /// Delete every expense row the owner has and insert `records` in their place, atomically.
    #[instrument(skip(self, records), fields(owner = %abbrev_uuid(&owner), count = records.len()), err)]
    pub async fn replace_all(&mut self, owner: UserId, records: &[ExpenseCreateDBRequest]) -> Result<Vec<ExpenseDBResponse>> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM expenses WHERE user_id = ?1")
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        let mut inserted = Vec::with_capacity(records.len());
        for record in records {
            if record.owner != owner {
                return Err(DbError::Other(anyhow::anyhow!(
                    "expense record {} does not belong to {}",
                    record.id,
                    abbrev_uuid(&owner)
                )));
            }
            inserted.push(insert(&mut *tx, record).await?);
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
