use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Body of `POST /api/categories`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryCreate {
    pub name: String,
}

/// Query for `DELETE /api/categories`
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct CategoryQuery {
    /// Category to remove
    pub name: Option<String>,
}
