use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    db::Role,
    extractors::AuthGuard,
    names,
    rejections::{AppError, ResultExt},
    utils, AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::SIGN_UP_URL, post(sign_up))
        .route(names::SIGN_IN_URL, post(sign_in))
        .route(names::SIGN_OUT_URL, post(sign_out))
        .route(names::ME_URL, get(me))
        .route(names::CHANGE_PASSWORD_URL, post(change_password))
}

#[derive(Deserialize)]
struct SignUpPost {
    email: String,
    password: String,
    username: String,
    role: Role,
}

async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpPost>,
) -> Result<axum::response::Response, AppError> {
    use crate::services::auth::RegisterOutcome;

    let outcome = state
        .auth
        .register(&body.email, &body.password, &body.username, body.role)
        .await
        .reject("registration failed")?;

    match outcome {
        RegisterOutcome::LoggedIn { token, user } => {
            let cookie = utils::cookie(names::USER_SESSION_COOKIE_NAME, &token, state.secure_cookies)
                .reject("could not build session cookie")?;
            tracing::info!("new {} account: {}", user.role, user.id);
            state.contexts.init(&token, user.clone());
            Ok((StatusCode::CREATED, [(SET_COOKIE, cookie)], Json(user)).into_response())
        }
        RegisterOutcome::EmptyFields => Err(AppError::Input(
            "email, password and username are required".to_string(),
        )),
        RegisterOutcome::EmailTaken => {
            Err(AppError::Conflict("email is already registered".to_string()))
        }
        RegisterOutcome::WeakPassword => Err(AppError::Input(
            "password must be at least 8 characters".to_string(),
        )),
    }
}

#[derive(Deserialize)]
struct SignInPost {
    email: String,
    password: String,
}

async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInPost>,
) -> Result<axum::response::Response, AppError> {
    use crate::services::auth::LoginOutcome;

    let outcome = state
        .auth
        .login(&body.email, &body.password)
        .await
        .reject("login failed")?;

    match outcome {
        LoginOutcome::Success { token, user } => {
            // earlier sessions are gone from the store; drop what they held here too
            state.contexts.teardown_user(&user.id);
            state.quiz.discard_all(&user.id);

            let cookie = utils::cookie(names::USER_SESSION_COOKIE_NAME, &token, state.secure_cookies)
                .reject("could not build session cookie")?;
            state.contexts.init(&token, user.clone());
            Ok(([(SET_COOKIE, cookie)], Json(user)).into_response())
        }
        LoginOutcome::InvalidCredentials => {
            Err(AppError::Input("incorrect email or password".to_string()))
        }
    }
}

async fn sign_out(
    AuthGuard { user, token }: AuthGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth
        .logout(&token)
        .await
        .reject("could not delete session")?;
    state.contexts.teardown_user(&user.id);
    state.quiz.discard_all(&user.id);

    let cleared = utils::clear_cookie(names::USER_SESSION_COOKIE_NAME, state.secure_cookies)
        .reject("could not build clear-session cookie")?;

    Ok(([(SET_COOKIE, cleared)], StatusCode::NO_CONTENT))
}

async fn me(
    AuthGuard { user, token }: AuthGuard,
    State(state): State<AppState>,
) -> Json<serde_json::Value> {
    Json(json!({
        "user": user,
        "playing": state.contexts.playing(&token),
    }))
}

#[derive(Deserialize)]
struct ChangePasswordPost {
    current_password: String,
    new_password: String,
    confirm_password: String,
}

async fn change_password(
    AuthGuard { user, .. }: AuthGuard,
    State(state): State<AppState>,
    Json(body): Json<ChangePasswordPost>,
) -> Result<StatusCode, AppError> {
    use crate::services::auth::ChangePasswordOutcome;

    let outcome = state
        .auth
        .change_password(
            &user.id,
            &body.current_password,
            &body.new_password,
            &body.confirm_password,
        )
        .await
        .reject("could not change password")?;

    match outcome {
        ChangePasswordOutcome::Success => Ok(StatusCode::NO_CONTENT),
        ChangePasswordOutcome::EmptyFields => {
            Err(AppError::Input("all fields are required".to_string()))
        }
        ChangePasswordOutcome::Mismatch => {
            Err(AppError::Input("new passwords do not match".to_string()))
        }
        ChangePasswordOutcome::WeakPassword => Err(AppError::Input(
            "password must be at least 8 characters".to_string(),
        )),
        ChangePasswordOutcome::IncorrectPassword => {
            Err(AppError::Input("current password is incorrect".to_string()))
        }
    }
}
