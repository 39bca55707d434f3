use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;
use uuid::Uuid;

use super::dto::{CreateTask, TaskListParams, UpdateChecklist, UpdateProgress, UpdateTask};
use super::model::{Task, TaskListResponse, TaskResponse, UserRef};
use super::queries;
use crate::progress;
use crate::routes::middleware_auth::{AuthUser, JwtUser};
use crate::routes::users::total_pages;
use crate::state::AppState;

fn db_error(e: sqlx::Error, what: &str) -> (StatusCode, String) {
    eprintln!("{}: {:?}", what, e);
    (StatusCode::INTERNAL_SERVER_ERROR, what.to_string())
}

/// Resolve every user referenced by the given tasks in one query
async fn populate(
    state: &AppState,
    tasks: &[Task],
) -> Result<HashMap<Uuid, UserRef>, (StatusCode, String)> {
    let mut ids: Vec<Uuid> = Vec::new();
    for task in tasks {
        ids.push(task.created_by);
        ids.extend(task.assigned_to.iter().copied());
    }
    ids.sort_unstable();
    ids.dedup();

    let refs = queries::user_refs(&state.db, &ids)
        .await
        .map_err(|e| db_error(e, "Failed to resolve users"))?;

    Ok(refs.into_iter().map(|r| (r.id, r)).collect())
}

async fn populate_one(
    state: &AppState,
    task: Task,
) -> Result<TaskResponse, (StatusCode, String)> {
    let users = populate(state, std::slice::from_ref(&task)).await?;
    Ok(TaskResponse::build(task, &users))
}

/// Verify every assigned user ID exists before writing it into a task
async fn check_assignees(
    state: &AppState,
    assigned_to: &Option<Vec<Uuid>>,
) -> Result<(), (StatusCode, String)> {
    if let Some(ids) = assigned_to {
        if !ids.is_empty() {
            let found = queries::count_users_in(&state.db, ids)
                .await
                .map_err(|e| db_error(e, "Failed to check assigned users"))?;
            if found != ids.len() as i64 {
                return Err((
                    StatusCode::BAD_REQUEST,
                    "One or more assigned users not found".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Load a task and require the requester to be its creator or an admin
async fn load_owned(
    state: &AppState,
    user: &AuthUser,
    task_id: Uuid,
) -> Result<Task, (StatusCode, String)> {
    let task = queries::get_task(&state.db, task_id)
        .await
        .map_err(|e| db_error(e, "Failed to fetch task"))?
        .ok_or((StatusCode::NOT_FOUND, "Task not found".to_string()))?;

    if task.created_by != user.id && !user.is_admin() {
        return Err((
            StatusCode::FORBIDDEN,
            "Not authorized to modify this task".to_string(),
        ));
    }

    Ok(task)
}

// HANDLERS

pub async fn create(
    State(state): State<AppState>,
    JwtUser(user_id): JwtUser,
    Json(payload): Json<CreateTask>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }

    check_assignees(&state, &payload.assigned_to).await?;

    // Initial progress comes from the checklist when one is supplied;
    // clients cannot set progress or status directly.
    let (progress, status) = payload
        .todo_checklist
        .as_deref()
        .and_then(progress::checklist_progress)
        .unwrap_or((0, progress::status_for_progress(0)));

    let task = queries::create_task(&state.db, user_id, &payload, progress, status)
        .await
        .map_err(|e| db_error(e, "Failed to create task"))?;

    let response = populate_one(&state, task).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list(
    State(state): State<AppState>,
    JwtUser(_user_id): JwtUser,
    Query(params): Query<TaskListParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let (tasks, count) = queries::list_tasks(&state.db, &params)
        .await
        .map_err(|e| db_error(e, "Failed to list tasks"))?;

    let users = populate(&state, &tasks).await?;
    let tasks: Vec<TaskResponse> = tasks
        .into_iter()
        .map(|t| TaskResponse::build(t, &users))
        .collect();

    Ok(Json(TaskListResponse {
        tasks,
        total_pages: total_pages(count, limit),
        current_page: page,
        total_tasks: count,
    }))
}

pub async fn get(
    State(state): State<AppState>,
    JwtUser(_user_id): JwtUser,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let task = queries::get_task(&state.db, task_id)
        .await
        .map_err(|e| db_error(e, "Failed to fetch task"))?
        .ok_or((StatusCode::NOT_FOUND, "Task not found".to_string()))?;

    let response = populate_one(&state, task).await?;

    Ok(Json(response))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTask>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    load_owned(&state, &user, task_id).await?;
    check_assignees(&state, &payload.assigned_to).await?;

    let task = queries::update_task(&state.db, task_id, payload)
        .await
        .map_err(|e| db_error(e, "Failed to update task"))?;

    let response = populate_one(&state, task).await?;

    Ok(Json(response))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    load_owned(&state, &user, task_id).await?;

    let deleted = queries::delete_task(&state.db, task_id)
        .await
        .map_err(|e| db_error(e, "Failed to delete task"))?;

    if deleted == 0 {
        return Err((StatusCode::NOT_FOUND, "Task not found".to_string()));
    }

    Ok(Json(
        serde_json::json!({"message": "Task removed successfully"}),
    ))
}

/// Set progress directly; status follows the derivation rule. An
/// out-of-range value is rejected before the task is touched.
pub async fn update_progress(
    State(state): State<AppState>,
    JwtUser(_user_id): JwtUser,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateProgress>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    progress::validate_progress(payload.progress)
        .map_err(|message| (StatusCode::BAD_REQUEST, message))?;

    let exists = queries::get_task(&state.db, task_id)
        .await
        .map_err(|e| db_error(e, "Failed to fetch task"))?;
    if exists.is_none() {
        return Err((StatusCode::NOT_FOUND, "Task not found".to_string()));
    }

    let status = progress::status_for_progress(payload.progress);
    let task = queries::set_progress(&state.db, task_id, payload.progress, status)
        .await
        .map_err(|e| db_error(e, "Failed to update progress"))?;

    let response = populate_one(&state, task).await?;

    Ok(Json(response))
}

/// Replace the checklist; a non-empty checklist drives progress and status
pub async fn update_todos(
    State(state): State<AppState>,
    JwtUser(_user_id): JwtUser,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateChecklist>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let exists = queries::get_task(&state.db, task_id)
        .await
        .map_err(|e| db_error(e, "Failed to fetch task"))?;
    if exists.is_none() {
        return Err((StatusCode::NOT_FOUND, "Task not found".to_string()));
    }

    let derived = progress::checklist_progress(&payload.todo_checklist);
    let task = queries::set_checklist(&state.db, task_id, payload.todo_checklist, derived)
        .await
        .map_err(|e| db_error(e, "Failed to update checklist"))?;

    let response = populate_one(&state, task).await?;

    Ok(Json(response))
}
