//! Database models for per-user settings.

use crate::api::models::settings::Theme;
use crate::types::UserId;
use chrono::{DateTime, Utc};

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UserSettingsUpdateDBRequest {
    pub theme: Option<Theme>,
    pub active_tab: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserSettingsDBResponse {
    pub user_id: UserId,
    pub theme: Theme,
    pub active_tab: String,
    pub updated_at: DateTime<Utc>,
}
