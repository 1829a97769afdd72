//! HTTP request handlers for all API endpoints.
//!
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication, by taking a [`CurrentUser`](crate::api::models::users::CurrentUser) argument
//! - Running repository calls scoped to the caller's own rows
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`auth`]: Registration, login, logout, password change and `/api/me`
//! - [`income`]: Income record CRUD
//! - [`expenses`]: Expense record CRUD
//! - [`categories`]: Category listing and explicit additions
//! - [`summary`]: Totals, USD conversion and category breakdown
//! - [`rates`]: The cached exchange rate
//! - [`transfer`]: Ledger export and import
//! - [`settings`]: Theme and active tab
//! - [`health`]: Liveness check
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to the matching HTTP status code.

pub mod auth;
pub mod categories;
pub mod expenses;
pub mod health;
pub mod income;
pub mod rates;
pub mod settings;
pub mod summary;
pub mod transfer;
