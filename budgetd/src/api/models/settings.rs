//! API models for per-user settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::settings::{UserSettingsDBResponse, UserSettingsUpdateDBRequest};
use crate::errors::Error;

/// Tab shown when a user has never saved settings
pub const DEFAULT_ACTIVE_TAB: &str = "income";

const MAX_TAB_LENGTH: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettingsResponse {
    pub theme: Theme,
    pub active_tab: String,
    /// Absent until the settings are saved for the first time
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for SettingsResponse {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            active_tab: DEFAULT_ACTIVE_TAB.to_string(),
            updated_at: None,
        }
    }
}

impl From<UserSettingsDBResponse> for SettingsResponse {
    fn from(db: UserSettingsDBResponse) -> Self {
        Self {
            theme: db.theme,
            active_tab: db.active_tab,
            updated_at: Some(db.updated_at),
        }
    }
}

/// Body of `PUT /api/settings`; omitted fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SettingsUpdate {
    pub theme: Option<Theme>,
    pub active_tab: Option<String>,
}

impl TryFrom<SettingsUpdate> for UserSettingsUpdateDBRequest {
    type Error = Error;

    fn try_from(update: SettingsUpdate) -> Result<Self, Self::Error> {
        let active_tab = match update.active_tab.map(|tab| tab.trim().to_string()) {
            Some(tab) if tab.is_empty() => {
                return Err(Error::BadRequest {
                    message: "active_tab must not be blank".to_string(),
                });
            }
            Some(tab) if tab.chars().count() > MAX_TAB_LENGTH => {
                return Err(Error::BadRequest {
                    message: format!("active_tab must be at most {MAX_TAB_LENGTH} characters"),
                });
            }
            tab => tab,
        };

        Ok(Self {
            theme: update.theme,
            active_tab,
        })
    }
}
