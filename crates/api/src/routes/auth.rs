use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use services::{AppServices, Session};
use wellness_core::model::{User, UserId};

use crate::error::ApiError;
use crate::extract::AuthUser;

/// Fields are optional so a missing one is reported as such instead of as bad JSON.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserBody {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            email: user.email().to_owned(),
            name: user.name().to_owned(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserBody,
    pub token: String,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            user: UserBody::from(&session.user),
            token: session.token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserBody,
}

pub async fn register(
    State(services): State<AppServices>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let Json(request) = payload?;
    let session = services
        .auth()
        .register(
            request.email.as_deref().unwrap_or_default(),
            request.password.as_deref().unwrap_or_default(),
            request.name.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

pub async fn login(
    State(services): State<AppServices>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(request) = payload?;
    let session = services
        .auth()
        .login(
            request.email.as_deref().unwrap_or_default(),
            request.password.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(session.into()))
}

pub async fn current_user(
    State(services): State<AppServices>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = services.auth().current_user(user_id).await?;
    Ok(Json(UserResponse {
        user: UserBody::from(&user),
    }))
}
