use crate::routes::middleware_auth::JwtUser;
use crate::routes::users::{User, UserResponse, UserRole};
use crate::state::AppState;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::env;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub profile_image_url: Option<String>,
    pub admin_invite_token: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
}

fn issue_token(user_id: Uuid) -> Result<String, (StatusCode, String)> {
    let secret = env::var("JWT_SECRET").expect("JWT_SECRET not found");
    let now = Utc::now();
    let exp = now + Duration::hours(24);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        eprintln!("jwt encode error: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "token error".to_string())
    })
}

fn hash_password(password: &str) -> Result<String, (StatusCode, String)> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            eprintln!("password hash error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "could not hash password".to_string(),
            )
        })
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegistrationRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.len() < 8
    {
        return Err((StatusCode::BAD_REQUEST, "invalid payload".to_string()));
    }

    // Registering with the invite token grants the admin role
    let role = match (&payload.admin_invite_token, env::var("ADMIN_INVITE_TOKEN")) {
        (Some(token), Ok(expected)) if *token == expected => UserRole::Admin,
        _ => UserRole::Member,
    };

    let password_hash = hash_password(&payload.password)?;
    let user_id = Uuid::new_v4();

    let user = match sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, profile_image_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(payload.name.trim())
    .bind(payload.email.trim())
    .bind(&password_hash)
    .bind(role)
    .bind(&payload.profile_image_url)
    .fetch_one(&state.db)
    .await
    {
        Ok(user) => user,
        Err(e) => {
            if let Some(db_error) = e.as_database_error() {
                if db_error.code() == Some(std::borrow::Cow::Borrowed("23505")) {
                    return Err((
                        StatusCode::CONFLICT,
                        "Email already registered".to_string(),
                    ));
                }
            }
            eprintln!("DB insert error: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "could not create user".to_string(),
            ));
        }
    };

    let token = issue_token(user.id)?;

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            token,
            user: UserResponse::from(user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            eprintln!("DB Error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "db error".to_string())
        })?;

    let user = match user {
        Some(user) => user,
        None => {
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()));
        }
    };

    let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
        eprintln!("stored hash is malformed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "credential error".to_string(),
        )
    })?;
    let verify = Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !verify {
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()));
    }

    let token = issue_token(user.id)?;

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// Current user's own profile
pub async fn profile(
    State(state): State<AppState>,
    JwtUser(user_id): JwtUser,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            eprintln!("Failed to fetch profile: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch profile".to_string(),
            )
        })?;

    match user {
        Some(user) => Ok(Json(UserResponse::from(user))),
        None => Err((StatusCode::NOT_FOUND, "User not found".to_string())),
    }
}

/// Update own name, email, password or profile image
pub async fn update_profile(
    State(state): State<AppState>,
    JwtUser(user_id): JwtUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Some(password) = &payload.password {
        if password.len() < 8 {
            return Err((
                StatusCode::BAD_REQUEST,
                "Password must be at least 8 characters".to_string(),
            ));
        }
    }

    if let Some(email) = &payload.email {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
        )
        .bind(email)
        .bind(user_id)
        .fetch_one(&state.db)
        .await
        .map_err(|e| {
            eprintln!("Failed to check email: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            )
        })?;

        if taken {
            return Err((StatusCode::BAD_REQUEST, "Email already in use".to_string()));
        }
    }

    let password_hash = match &payload.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    // Build dynamic update query based on what fields are provided
    let mut query = String::from("UPDATE users SET updated_at = NOW()");
    let mut bind_count = 1;

    if payload.name.is_some() {
        query.push_str(&format!(", name = ${}", bind_count));
        bind_count += 1;
    }
    if payload.email.is_some() {
        query.push_str(&format!(", email = ${}", bind_count));
        bind_count += 1;
    }
    if password_hash.is_some() {
        query.push_str(&format!(", password_hash = ${}", bind_count));
        bind_count += 1;
    }
    if payload.profile_image_url.is_some() {
        query.push_str(&format!(", profile_image_url = ${}", bind_count));
        bind_count += 1;
    }

    query.push_str(&format!(" WHERE id = ${} RETURNING *", bind_count));

    let mut query_builder = sqlx::query_as::<_, User>(&query);

    if let Some(name) = payload.name {
        query_builder = query_builder.bind(name);
    }
    if let Some(email) = payload.email {
        query_builder = query_builder.bind(email);
    }
    if let Some(password_hash) = password_hash {
        query_builder = query_builder.bind(password_hash);
    }
    if let Some(profile_image_url) = payload.profile_image_url {
        query_builder = query_builder.bind(profile_image_url);
    }

    let user = query_builder
        .bind(user_id)
        .fetch_one(&state.db)
        .await
        .map_err(|e| {
            eprintln!("Failed to update profile: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update profile".to_string(),
            )
        })?;

    Ok(Json(UserResponse::from(user)))
}
