//! Database repository for per-user settings.

use crate::api::models::settings::Theme;
use crate::db::{
    errors::Result,
    models::settings::{UserSettingsDBResponse, UserSettingsUpdateDBRequest},
};
use crate::types::{UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct Settings {
    pub user_id: UserId,
    pub theme: Theme,
    pub active_tab: String,
    pub updated_at: DateTime<Utc>,
}

impl From<Settings> for UserSettingsDBResponse {
    fn from(s: Settings) -> Self {
        Self {
            user_id: s.user_id,
            theme: s.theme,
            active_tab: s.active_tab,
            updated_at: s.updated_at,
        }
    }
}

pub struct UserSettings<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> UserSettings<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// `None` until the user saves settings for the first time.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get(&mut self, user_id: UserId) -> Result<Option<UserSettingsDBResponse>> {
        let settings = sqlx::query_as::<_, Settings>("SELECT * FROM user_settings WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(settings.map(Into::into))
    }

    /// Insert or partially update the settings row. Unset fields keep their stored (or default) value.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn upsert(&mut self, user_id: UserId, request: &UserSettingsUpdateDBRequest) -> Result<UserSettingsDBResponse> {
        let settings = sqlx::query_as::<_, Settings>(
            r#"
            INSERT INTO user_settings (user_id, theme, active_tab, updated_at)
            VALUES (?1, COALESCE(?2, 'light'), COALESCE(?3, 'income'), ?4)
            ON CONFLICT (user_id) DO UPDATE SET
                theme = COALESCE(?2, theme),
                active_tab = COALESCE(?3, active_tab),
                updated_at = ?4
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(request.theme)
        .bind(&request.active_tab)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(settings.into())
    }
}
