//! Registration, login, logout and the caller's own profile.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::Deserialize;
use store::{NewUser, Preferences, StoreError, UserInfo, UserSummary};
use tower_sessions::Session;
use tracing::info;

use crate::auth::{self, CurrentUser, MIN_PASSWORD_CHARS};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create an account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    let Json(request) = payload?;
    let email = normalize_email(&request.email);
    let name = request.name.trim().to_string();

    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    if request.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }

    let password_hash = auth::hash_blocking(request.password).await?;
    let user = state
        .store
        .create_user(NewUser {
            email,
            name,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict => ApiError::EmailTaken,
            e => e.into(),
        })?;

    auth::sign_in(&session, user.id).await?;
    info!(user_id = %user.id, "registered");
    Ok((StatusCode::CREATED, Json(user.to_summary())))
}

/// Log in with email and password.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<UserSummary>> {
    let Json(request) = payload?;
    let email = normalize_email(&request.email);

    let Some(user) = state.store.user_by_email(&email).await? else {
        auth::verify_dummy(request.password).await?;
        return Err(ApiError::InvalidCredentials);
    };
    if !auth::verify_blocking(request.password, user.password_hash.clone()).await? {
        return Err(ApiError::InvalidCredentials);
    }

    auth::sign_in(&session, user.id).await?;
    info!(user_id = %user.id, "logged in");
    Ok(Json(user.to_summary()))
}

pub async fn logout(session: Session) -> ApiResult<StatusCode> {
    session.flush().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserInfo> {
    Json(user.to_info())
}

/// Replace the caller's housing preferences.
pub async fn update_preferences(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<Preferences>, JsonRejection>,
) -> ApiResult<Json<UserInfo>> {
    let Json(mut preferences) = payload?;

    if let Some(budget) = preferences.budget {
        if budget.min > budget.max {
            return Err(ApiError::BadRequest(
                "Budget minimum cannot exceed the maximum".to_string(),
            ));
        }
    }
    preferences.location = preferences
        .location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());

    let user = state.store.update_preferences(user.id, preferences).await?;
    Ok(Json(user.to_info()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn test_register_returns_summary_and_session() {
        let app = TestApp::new();
        let response = app
            .request(
                Method::POST,
                "/api/register",
                None,
                Some(json!({ "email": "  Ada@Example.com ", "name": " Ada ", "password": "correct horse" })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body, json!({ "email": "ada@example.com", "name": "Ada" }));

        let cookie = response.cookie.unwrap();
        let me = app
            .request(Method::GET, "/api/me", Some(&cookie), None)
            .await;
        assert_eq!(me.status, StatusCode::OK);
        assert_eq!(me.body["email"], "ada@example.com");
        assert_eq!(me.body["isPremium"], false);
        assert!(me.body.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let app = TestApp::new();
        app.register("Ada").await;
        let response = app
            .request(
                Method::POST,
                "/api/register",
                None,
                Some(json!({ "email": "ADA@example.com", "name": "Other", "password": "password123" })),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "Email already in use");
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let app = TestApp::new();
        for body in [
            json!({ "email": "not-an-email", "name": "A", "password": "password123" }),
            json!({ "email": "a@example.com", "name": "  ", "password": "password123" }),
            json!({ "email": "a@example.com", "name": "A", "password": "short" }),
            json!({ "email": "a@example.com" }),
        ] {
            let response = app
                .request(Method::POST, "/api/register", None, Some(body))
                .await;
            assert_eq!(response.status, StatusCode::BAD_REQUEST);
            assert!(response.body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let app = TestApp::new();
        app.register("Ada").await;

        let wrong = app
            .request(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "email": "ada@example.com", "password": "wrong password" })),
            )
            .await;
        assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
        let unknown = app
            .request(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "email": "bob@example.com", "password": "wrong password" })),
            )
            .await;
        assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.body, unknown.body);

        let ok = app
            .request(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "email": "Ada@example.com", "password": "hunter2hunter2" })),
            )
            .await;
        assert_eq!(ok.status, StatusCode::OK);
        assert_eq!(ok.body["name"], "Ada");
        let cookie = ok.cookie.unwrap();

        let logout = app
            .request(Method::POST, "/api/logout", Some(&cookie), None)
            .await;
        assert_eq!(logout.status, StatusCode::NO_CONTENT);
        let me = app
            .request(Method::GET, "/api/me", Some(&cookie), None)
            .await;
        assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_routes_require_session() {
        let app = TestApp::new();
        for (method, uri) in [
            (Method::GET, "/api/me"),
            (Method::GET, "/api/matches"),
            (Method::GET, "/api/discover"),
            (Method::GET, "/api/conversations"),
            (Method::GET, "/api/notifications"),
            (Method::GET, "/api/premium/check"),
            (Method::GET, "/api/premium/feature"),
        ] {
            let response = app.request(method, uri, None, None).await;
            assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(response.body["error"], "Authentication required");
        }
    }

    #[tokio::test]
    async fn test_update_preferences() {
        let app = TestApp::new();
        let ada = app.register("Ada").await;

        let response = app
            .request(
                Method::PUT,
                "/api/preferences",
                Some(&ada.cookie),
                Some(json!({
                    "location": " Berlin ",
                    "budget": { "min": 500, "max": 800 },
                    "moveInDate": "2026-09-01"
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        let prefs = &response.body["preferences"];
        assert_eq!(prefs["location"], "Berlin");
        assert_eq!(prefs["budget"]["max"], 800);
        assert_eq!(prefs["moveInDate"], "2026-09-01");

        let inverted = app
            .request(
                Method::PUT,
                "/api/preferences",
                Some(&ada.cookie),
                Some(json!({ "budget": { "min": 900, "max": 800 } })),
            )
            .await;
        assert_eq!(inverted.status, StatusCode::BAD_REQUEST);
    }
}
