//! Database models for explicitly added categories.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct CategoryDBResponse {
    pub name: String,
    pub created_at: DateTime<Utc>,
}
