//! Authentication.
//!
//! Users sign in with email and password. A successful login issues a signed JWT which the
//! browser keeps in an HTTP-only session cookie; every ledger route requires it.
//!
//! # Modules
//!
//! - [`current_user`]: Extractor that resolves the session cookie into a [`CurrentUser`]
//! - [`password`]: Password hashing and verification using Argon2
//! - [`session`]: JWT session token creation and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use budgetd::api::models::users::CurrentUser;
//!
//! async fn protected_handler(current_user: CurrentUser) -> String {
//!     format!("Hello, {}!", current_user.name)
//! }
//! ```
//!
//! [`CurrentUser`]: crate::api::models::users::CurrentUser

pub mod current_user;
pub mod password;
pub mod session;
