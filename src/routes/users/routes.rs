use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use super::{
    total_pages, UpdateUserRequest, User, UserListParams, UserListResponse, UserResponse,
};
use crate::routes::middleware_auth::AdminUser;
use crate::state::AppState;

// HANDLERS (all admin-only)

/// List users with optional name/email search, newest first
pub async fn list(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let search = params
        .search
        .as_deref()
        .map(|s| format!("%{}%", s.trim()));

    let mut where_clause = String::new();
    if search.is_some() {
        where_clause.push_str(" WHERE (name ILIKE $1 OR email ILIKE $1)");
    }

    let list_query = format!(
        "SELECT * FROM users{} ORDER BY created_at DESC LIMIT {} OFFSET {}",
        where_clause,
        limit,
        (page - 1) * limit
    );
    let count_query = format!("SELECT COUNT(*) FROM users{}", where_clause);

    let mut users_builder = sqlx::query_as::<_, User>(&list_query);
    let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
    if let Some(pattern) = &search {
        users_builder = users_builder.bind(pattern);
        count_builder = count_builder.bind(pattern);
    }

    let users = users_builder.fetch_all(&state.db).await.map_err(|e| {
        eprintln!("Failed to list users: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list users".to_string(),
        )
    })?;

    let count = count_builder.fetch_one(&state.db).await.map_err(|e| {
        eprintln!("Failed to count users: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to count users".to_string(),
        )
    })?;

    Ok(Json(UserListResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
        total_pages: total_pages(count, limit),
        current_page: page,
        total_users: count,
    }))
}

/// Get a single user by ID
pub async fn get(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            eprintln!("Failed to fetch user: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch user".to_string(),
            )
        })?;

    match user {
        Some(user) => Ok(Json(UserResponse::from(user))),
        None => Err((StatusCode::NOT_FOUND, "User not found".to_string())),
    }
}

/// Update a user's name, email, role or profile image
pub async fn update(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&state.db)
            .await
            .map_err(|e| {
                eprintln!("Failed to check user: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            })?;

    if !exists {
        return Err((StatusCode::NOT_FOUND, "User not found".to_string()));
    }

    // A changed email must stay unique across the table
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
    if payload.role.is_some() {
        query.push_str(&format!(", role = ${}", bind_count));
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
    if let Some(role) = payload.role {
        query_builder = query_builder.bind(role);
    }
    if let Some(profile_image_url) = payload.profile_image_url {
        query_builder = query_builder.bind(profile_image_url);
    }

    let user = query_builder
        .bind(user_id)
        .fetch_one(&state.db)
        .await
        .map_err(|e| {
            eprintln!("Failed to update user: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update user".to_string(),
            )
        })?;

    Ok(Json(UserResponse::from(user)))
}

/// Delete a user
pub async fn delete(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            eprintln!("Failed to delete user: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete user".to_string(),
            )
        })?;

    if result.rows_affected() == 0 {
        return Err((StatusCode::NOT_FOUND, "User not found".to_string()));
    }

    Ok(Json(
        serde_json::json!({"message": "User removed successfully"}),
    ))
}
