//! Landing and signup handlers.

use crate::flash::{self, Flash};
use crate::views::{self, SignupValues};
use crate::AppState;
use axum::{
    extract::{Extension, Form},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use support_db::register_user;
use support_types::NewUser;

/// Form body for `POST /signup`. All three fields are required.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub name: String,
}

impl SignupForm {
    fn values(&self) -> SignupValues<'_> {
        SignupValues {
            username: &self.username,
            name: &self.name,
        }
    }
}

/// Handler for `GET /`.
///
/// Shows the confirmation text and, if one is pending, a notice left by a
/// previous redirect. A shown notice is cleared.
pub async fn landing_handler(headers: HeaderMap) -> Response {
    let pending = Flash::from_headers(&headers);
    let html = Html(views::landing(pending.as_ref()));

    match pending {
        Some(_) => ([(header::SET_COOKIE, flash::clear_cookie())], html).into_response(),
        None => html.into_response(),
    }
}

/// Handler for `GET /signup`.
pub async fn signup_form_handler() -> Html<String> {
    Html(views::signup_form(None, &SignupValues::default()))
}

/// Handler for `POST /signup`.
///
/// On success redirects to `/` with a success notice. On failure the form is
/// redisplayed with the error text; a store error is shown as the store
/// reported it.
pub async fn signup_submit_handler(
    Extension(state): Extension<Arc<AppState>>,
    Form(form): Form<SignupForm>,
) -> Response {
    let user = match NewUser::new(&form.username, &form.password, &form.name) {
        Ok(user) => user,
        Err(e) => return redisplay(&form, Flash::danger(format!("Error: {e}"))),
    };

    let provider = state.provider.clone();
    let result = tokio::task::spawn_blocking(move || register_user(provider.as_ref(), &user)).await;

    match result {
        Ok(Ok(user_id)) => {
            tracing::debug!(user_id, "signup complete, redirecting to landing page");
            (
                [(header::SET_COOKIE, Flash::success("Signup successful!").to_cookie())],
                Redirect::to("/"),
            )
                .into_response()
        }
        Ok(Err(e)) => {
            if e.is_duplicate_username() {
                tracing::warn!(username = %form.username, "signup rejected: username taken");
            } else {
                tracing::error!(error = %e, "signup failed");
            }
            redisplay(&form, Flash::danger(format!("Error: {e}")))
        }
        Err(e) => {
            tracing::error!(error = %e, "signup task panicked or was cancelled");
            redisplay(&form, Flash::danger("Error: signup could not be completed"))
        }
    }
}

fn redisplay(form: &SignupForm, notice: Flash) -> Response {
    Html(views::signup_form(Some(&notice), &form.values())).into_response()
}
