//! Database record models matching table schemas.
//!
//! These structs are what repositories accept and return. They are distinct from the API models in
//! [`crate::api::models`] so that storage and wire representations can evolve independently.
//!
//! - [`users`]: User accounts and password hashes
//! - [`income`]: Income line items
//! - [`expenses`]: Expense line items with a category
//! - [`categories`]: Explicitly added category names
//! - [`settings`]: Per-user presentation state (theme, active tab)
//! - [`exchange_rates`]: The cached KRW/USD rate

pub mod categories;
pub mod exchange_rates;
pub mod expenses;
pub mod income;
pub mod settings;
pub mod users;
