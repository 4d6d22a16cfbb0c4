//! Auth route handlers.
//!
//! Authentication is a thin passthrough: credentials go to the commerce API,
//! which returns a bearer token the session holds on to. No credential
//! material is validated or stored here beyond basic shape checks.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use curio_core::Email;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::commerce::CommerceError;
use crate::filters;
use crate::error::{AppError, Result};
use crate::middleware::{clear_customer_token, set_customer_token};
use crate::models::{CurrentCustomer, session_keys};
use crate::routes::cart::clear_applied_promotion;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub email: String,
}

/// Display the login page.
#[instrument]
pub async fn login_page() -> impl IntoResponse {
    LoginTemplate {
        error: None,
        email: String::new(),
    }
}

/// Log a customer in.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = match Email::parse(form.email.trim()) {
        Ok(email) => email,
        Err(e) => {
            return Ok(LoginTemplate {
                error: Some(e.to_string()),
                email: form.email,
            }
            .into_response());
        }
    };

    match state.commerce().login(email.as_str(), &form.password).await {
        Ok(token) => {
            set_customer_token(&session, &token)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            session
                .insert(session_keys::CURRENT_CUSTOMER, &CurrentCustomer { email })
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;

            Ok(Redirect::to("/").into_response())
        }
        // Bad credentials render inline, next to the form
        Err(CommerceError::Unauthorized) => Ok(LoginTemplate {
            error: Some("Invalid email or password".to_string()),
            email: form.email,
        }
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Log the customer out.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_customer_token(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    session
        .remove::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    clear_applied_promotion(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Redirect::to("/"))
}
