//! Database repository for income records.

use crate::db::{
    errors::{DbError, Result},
    handlers::{decode_amount, encode_amount, repository::Repository},
    models::income::{IncomeCreateDBRequest, IncomeDBResponse, IncomeUpdateDBRequest},
};
use crate::types::{RecordKey, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow, SqliteConnection};
use tracing::instrument;

/// Filter for listing one user's income. Date bounds are inclusive ISO dates.
#[derive(Debug, Clone)]
pub struct IncomeFilter {
    pub owner: UserId,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl IncomeFilter {
    pub fn new(owner: UserId) -> Self {
        Self { owner, from: None, to: None }
    }
}

#[derive(Debug, Clone, FromRow)]
struct Income {
    pub user_id: UserId,
    pub id: String,
    pub date: String,
    pub description: String,
    pub amount: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Income> for IncomeDBResponse {
    type Error = DbError;

    fn try_from(row: Income) -> Result<Self> {
        Ok(Self {
            owner: row.user_id,
            id: row.id,
            date: row.date,
            description: row.description,
            amount: decode_amount(&row.amount)?,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct IncomeRecords<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for IncomeRecords<'c> {
    type CreateRequest = IncomeCreateDBRequest;
    type UpdateRequest = IncomeUpdateDBRequest;
    type Response = IncomeDBResponse;
    type Id = RecordKey;
    type Filter = IncomeFilter;

    #[instrument(skip(self, request), fields(record = %RecordKey::new(request.owner, request.id.clone())), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        insert(&mut *self.db, request).await
    }

    #[instrument(skip(self), fields(record = %id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let row = sqlx::query_as::<_, Income>("SELECT * FROM income WHERE user_id = ?1 AND id = ?2")
            .bind(id.owner)
            .bind(&id.id)
            .fetch_optional(&mut *self.db)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self, filter), fields(owner = %abbrev_uuid(&filter.owner)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let rows = sqlx::query_as::<_, Income>(
            r#"
            SELECT * FROM income
            WHERE user_id = ?1
              AND (?2 IS NULL OR date >= ?2)
              AND (?3 IS NULL OR date <= ?3)
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(filter.owner)
        .bind(&filter.from)
        .bind(&filter.to)
        .fetch_all(&mut *self.db)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self), fields(record = %id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM income WHERE user_id = ?1 AND id = ?2")
            .bind(id.owner)
            .bind(&id.id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(record = %id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let row = sqlx::query_as::<_, Income>(
            r#"
            UPDATE income SET
                date = ?3,
                description = ?4,
                amount = ?5,
                notes = ?6,
                updated_at = ?7
            WHERE user_id = ?1 AND id = ?2
            RETURNING *
            "#,
        )
        .bind(id.owner)
        .bind(&id.id)
        .bind(&request.date)
        .bind(&request.description)
        .bind(encode_amount(&request.amount))
        .bind(&request.notes)
        .bind(Utc::now())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        row.try_into()
    }
}

async fn insert(conn: &mut SqliteConnection, request: &IncomeCreateDBRequest) -> Result<IncomeDBResponse> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, Income>(
        r#"
        INSERT INTO income (user_id, id, date, description, amount, notes, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
        RETURNING *
        "#,
    )
    .bind(request.owner)
    .bind(&request.id)
    .bind(&request.date)
    .bind(&request.description)
    .bind(encode_amount(&request.amount))
    .bind(&request.notes)
    .bind(now)
    .fetch_one(conn)
    .await?;

    row.try_into()
}

impl<'c> IncomeRecords<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(record = %id), err)]
    pub async fn exists(&mut self, id: &RecordKey) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM income WHERE user_id = ?1 AND id = ?2")
            .bind(id.owner)
            .bind(&id.id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(found.is_some())
    }

    /// Delete every income row the owner has and insert `records` in their place.
    ///
    /// Runs inside a transaction (a savepoint when the connection is already in one), so either all
    /// rows are replaced or none are.
    #[instrument(skip(self, records), fields(owner = %abbrev_uuid(&owner), count = records.len()), err)]
    pub async fn replace_all(&mut self, owner: UserId, records: &[IncomeCreateDBRequest]) -> Result<Vec<IncomeDBResponse>> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM income WHERE user_id = ?1")
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        let mut inserted = Vec::with_capacity(records.len());
        for record in records {
            if record.owner != owner {
                return Err(DbError::Other(anyhow::anyhow!(
                    "income record {} does not belong to {}",
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
