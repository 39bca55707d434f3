use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use super::{export_task, snapshot, ExportParams, ReportParams};
use crate::reports::{compute_statistics, export_rows, render_csv, TaskSnapshot};
use crate::routes::middleware_auth::JwtUser;
use crate::routes::tasks::model::{Task, UserRef};
use crate::routes::tasks::queries::user_refs;
use crate::state::AppState;

/// Dashboard statistics over tasks scoped by user and/or creation range
pub async fn task_report(
    State(state): State<AppState>,
    JwtUser(_user_id): JwtUser,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut clauses: Vec<String> = Vec::new();
    let mut bind_count = 0;

    if params.user_id.is_some() {
        bind_count += 1;
        clauses.push(format!(
            "(created_by = ${0} OR ${0} = ANY(assigned_to))",
            bind_count
        ));
    }
    if params.start_date.is_some() {
        bind_count += 1;
        clauses.push(format!("created_at >= ${}", bind_count));
    }
    if params.end_date.is_some() {
        bind_count += 1;
        clauses.push(format!("created_at <= ${}", bind_count));
    }

    let mut query = String::from("SELECT * FROM tasks");
    if !clauses.is_empty() {
        query.push_str(&format!(" WHERE {}", clauses.join(" AND ")));
    }

    let mut query_builder = sqlx::query_as::<_, Task>(&query);
    if let Some(user_id) = params.user_id {
        query_builder = query_builder.bind(user_id);
    }
    if let Some(start_date) = params.start_date {
        query_builder = query_builder.bind(start_date);
    }
    if let Some(end_date) = params.end_date {
        query_builder = query_builder.bind(end_date);
    }

    let tasks = query_builder.fetch_all(&state.db).await.map_err(|e| {
        eprintln!("Failed to fetch report tasks: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch report tasks".to_string(),
        )
    })?;

    let snapshots: Vec<TaskSnapshot> = tasks.iter().map(snapshot).collect();
    let stats = compute_statistics(&snapshots, Utc::now());

    Ok(Json(stats))
}

/// Export filtered tasks as a CSV download, newest first
pub async fn export_tasks(
    State(state): State<AppState>,
    JwtUser(_user_id): JwtUser,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut clauses: Vec<String> = Vec::new();
    let mut bind_count = 0;

    if params.status.is_some() {
        bind_count += 1;
        clauses.push(format!("status = ${}", bind_count));
    }
    if params.priority.is_some() {
        bind_count += 1;
        clauses.push(format!("priority = ${}", bind_count));
    }
    if params.assigned_to.is_some() {
        bind_count += 1;
        clauses.push(format!("${} = ANY(assigned_to)", bind_count));
    }
    if params.created_by.is_some() {
        bind_count += 1;
        clauses.push(format!("created_by = ${}", bind_count));
    }

    let mut query = String::from("SELECT * FROM tasks");
    if !clauses.is_empty() {
        query.push_str(&format!(" WHERE {}", clauses.join(" AND ")));
    }
    query.push_str(" ORDER BY created_at DESC");

    let mut query_builder = sqlx::query_as::<_, Task>(&query);
    if let Some(status) = params.status {
        query_builder = query_builder.bind(status);
    }
    if let Some(priority) = params.priority {
        query_builder = query_builder.bind(priority);
    }
    if let Some(assigned_to) = params.assigned_to {
        query_builder = query_builder.bind(assigned_to);
    }
    if let Some(created_by) = params.created_by {
        query_builder = query_builder.bind(created_by);
    }

    let tasks = query_builder.fetch_all(&state.db).await.map_err(|e| {
        eprintln!("Failed to fetch export tasks: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch export tasks".to_string(),
        )
    })?;

    // Resolve creator and assignee names for the name columns
    let mut ids: Vec<Uuid> = Vec::new();
    for task in &tasks {
        ids.push(task.created_by);
        ids.extend(task.assigned_to.iter().copied());
    }
    ids.sort_unstable();
    ids.dedup();

    let users: HashMap<Uuid, UserRef> = user_refs(&state.db, &ids)
        .await
        .map_err(|e| {
            eprintln!("Failed to resolve users for export: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to resolve users".to_string(),
            )
        })?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    let export_input: Vec<_> = tasks.iter().map(|t| export_task(t, &users)).collect();
    let csv = render_csv(&export_rows(&export_input));

    let disposition = format!(
        "attachment; filename=tasks-{}.csv",
        Utc::now().timestamp_millis()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
