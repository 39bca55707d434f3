use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use std::env;
use uuid::Uuid;

use crate::routes::users::UserRole;
use crate::state::AppState;

/// Authenticated requester, injected by `require_auth`
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or((StatusCode::UNAUTHORIZED, "missing user"))
    }
}

pub struct JwtUser(pub Uuid);

impl<S> FromRequestParts<S> for JwtUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .map(|user| JwtUser(user.id))
            .ok_or((StatusCode::UNAUTHORIZED, "missing user"))
    }
}

/// Extractor for admin-only routes, rejects members with 403
pub struct AdminUser(pub Uuid);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthUser>()
            .ok_or((StatusCode::UNAUTHORIZED, "missing user"))?;

        match user.role {
            UserRole::Admin => Ok(AdminUser(user.id)),
            UserRole::Member => Err((StatusCode::FORBIDDEN, "admin access required")),
        }
    }
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
}

/// Validate the Bearer token, load the user's current role and inject
/// AuthUser. The role comes from the database, not the token, so role
/// changes take effect on the next request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, impl IntoResponse> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    let token = match auth_header {
        Some(h) if h.starts_with("Bearer ") => &h[7..],
        _ => {
            return Err((StatusCode::UNAUTHORIZED, "missing token"));
        }
    };

    let secret = env::var("JWT_SECRET").expect("JWT_SECRET is not found");

    let token_data = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("JWT decode error: {}", e);
            return Err((StatusCode::UNAUTHORIZED, "invalid token"));
        }
    };

    let user_id = match Uuid::parse_str(&token_data.claims.sub) {
        Ok(user_id) => user_id,
        Err(_) => {
            return Err((StatusCode::UNAUTHORIZED, "invalid subject"));
        }
    };

    let role: Option<UserRole> = match sqlx::query_scalar::<_, UserRole>(
        "SELECT role FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&state.db)
    .await
    {
        Ok(role) => role,
        Err(e) => {
            eprintln!("Failed to load user for auth: {:?}", e);
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "database error"));
        }
    };

    match role {
        Some(role) => {
            req.extensions_mut().insert(AuthUser { id: user_id, role });
            Ok(next.run(req).await)
        }
        None => Err((StatusCode::UNAUTHORIZED, "user no longer exists")),
    }
}
