//! OpenAPI documentation for the budget API.
//!
//! The generated document is served at `/api/openapi.json` and rendered with Scalar at `/api/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;
use crate::ledger::{ExpenseEntry, ExportDocument, IncomeEntry};
use crate::rates::RateSnapshot;

/// Cookie-based session scheme referenced by every authenticated path.
struct SessionSecurityAddon;

impl Modify for SessionSecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "session_token".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "budgetd_session",
                    "Session cookie set by `/authentication/login` or `/authentication/register`. \
                     The cookie name is configurable with `auth.native.session.cookie_name`.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "budgetd API",
        description = "Personal budget tracker: KRW income and expenses, USD conversion, category breakdown and JSON backup."
    ),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::change_password,
        api::handlers::auth::get_current_user,
        api::handlers::income::list_income,
        api::handlers::income::create_income,
        api::handlers::income::update_income,
        api::handlers::income::delete_income,
        api::handlers::expenses::list_expenses,
        api::handlers::expenses::create_expense,
        api::handlers::expenses::update_expense,
        api::handlers::expenses::delete_expense,
        api::handlers::categories::list_categories,
        api::handlers::categories::create_category,
        api::handlers::categories::delete_category,
        api::handlers::summary::get_summary,
        api::handlers::rates::get_rate,
        api::handlers::rates::refresh_rate,
        api::handlers::transfer::export_ledger,
        api::handlers::transfer::import_ledger,
        api::handlers::settings::get_settings,
        api::handlers::settings::update_settings,
        api::handlers::health::healthz,
    ),
    components(schemas(
        api::models::auth::RegisterRequest,
        api::models::auth::LoginRequest,
        api::models::auth::ChangePasswordRequest,
        api::models::auth::AuthResponse,
        api::models::auth::AuthSuccessResponse,
        api::models::users::UserResponse,
        api::models::users::CurrentUser,
        api::models::income::IncomeCreate,
        api::models::income::IncomeUpdate,
        api::models::income::IncomeResponse,
        api::models::expenses::ExpenseCreate,
        api::models::expenses::ExpenseUpdate,
        api::models::expenses::ExpenseResponse,
        api::models::categories::CategoryCreate,
        api::models::ledger::Money,
        api::models::ledger::CategoryShareResponse,
        api::models::ledger::SummaryResponse,
        api::models::ledger::ImportResponse,
        api::models::settings::Theme,
        api::models::settings::SettingsResponse,
        api::models::settings::SettingsUpdate,
        api::handlers::health::HealthResponse,
        RateSnapshot,
        IncomeEntry,
        ExpenseEntry,
        ExportDocument,
    )),
    modifiers(&SessionSecurityAddon),
    tags(
        (name = "authentication", description = "Registration, login and sessions"),
        (name = "income", description = "Income records"),
        (name = "expenses", description = "Expense records"),
        (name = "categories", description = "Expense categories"),
        (name = "ledger", description = "Summary, export and import"),
        (name = "rates", description = "KRW/USD exchange rate"),
        (name = "settings", description = "Per-user display settings"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;
