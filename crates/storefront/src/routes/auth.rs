//! Login, signup and logout pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::Nav;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::User;
use crate::services::auth::{AuthService, Signup};
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
    pub nav: Nav,
    pub email: String,
    pub error: Option<String>,
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub nav: Nav,
    pub email: String,
    pub full_name: String,
    pub error: Option<String>,
}

/// Where a freshly signed-in user lands.
fn landing(user: &User) -> Redirect {
    if user.role.is_admin() {
        Redirect::to("/admin")
    } else {
        Redirect::to("/")
    }
}

/// Display login page.
pub async fn login_page() -> impl IntoResponse {
    LoginTemplate {
        nav: Nav::default(),
        email: String::new(),
        error: None,
    }
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match AuthService::new(state.repos())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            set_current_user(&session, &user).await?;
            Ok(landing(&user).into_response())
        }
        Err(e) => {
            let error = AppError::from(e);
            let page = LoginTemplate {
                nav: Nav::default(),
                email: form.email,
                error: Some(error.public_message()),
            };
            Ok((error.status(), page).into_response())
        }
    }
}

/// Display signup page.
pub async fn signup_page() -> impl IntoResponse {
    SignupTemplate {
        nav: Nav::default(),
        email: String::new(),
        full_name: String::new(),
        error: None,
    }
}

/// Handle signup form submission.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<Signup>,
) -> Result<Response, AppError> {
    let email = form.email.clone();
    let full_name = form.full_name.clone();

    match AuthService::new(state.repos()).signup(form).await {
        Ok(user) => {
            set_current_user(&session, &user).await?;
            Ok(landing(&user).into_response())
        }
        Err(e) => {
            let error = AppError::from(e);
            let page = SignupTemplate {
                nav: Nav::default(),
                email,
                full_name,
                error: Some(error.public_message()),
            };
            Ok((error.status(), page).into_response())
        }
    }
}

/// Handle logout.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<impl IntoResponse, AppError> {
    clear_current_user(&session).await?;
    Ok(Redirect::to("/"))
}
