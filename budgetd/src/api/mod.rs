//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//! - **[`json`]**: The JSON body extractor, which answers 400 for bodies that do not parse
//!
//! # API Structure
//!
//! - **Authentication** (`/authentication/*`): Login, registration, logout, password change
//! - **Ledger records** (`/api/income`, `/api/expenses`): CRUD over the caller's own rows
//! - **Categories** (`/api/categories`): The merged category list and explicit additions
//! - **Summary** (`/api/summary`): Totals, USD conversion and the category breakdown
//! - **Exchange rate** (`/api/rate`): The cached KRW/USD rate
//! - **Transfer** (`/api/ledger/export`, `/api/ledger/import`): JSON backup and restore
//! - **Settings** (`/api/settings`): Theme and last active tab
//!
//! Every `/api/*` route requires a session cookie; without one it answers 401.
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa`. The document is served at `/api/openapi.json` and
//! rendered at `/api/docs`.

pub mod handlers;
pub mod json;
pub mod models;
