//! API request and response data models.
//!
//! These structures define the public API contract. They are kept apart from the database models
//! in [`crate::db::models`] so the storage representation can change without breaking clients.
//!
//! Request bodies are lenient (most fields optional) and are validated when they are converted
//! into database requests. Responses carry amounts as JSON numbers.
//!
//! # Model Categories
//!
//! - [`users`]: The authenticated user and the user profile
//! - [`auth`]: Login, registration and password change payloads
//! - [`records`]: Validation shared by income and expense bodies
//! - [`income`] / [`expenses`]: Ledger record bodies, responses and list filters
//! - [`categories`]: Category list and mutation payloads
//! - [`ledger`]: The summary view
//! - [`settings`]: Theme and active tab

pub mod auth;
pub mod categories;
pub mod expenses;
pub mod income;
pub mod ledger;
pub mod records;
pub mod settings;
pub mod users;
