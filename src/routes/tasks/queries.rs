use sqlx::{PgPool, Result};
use uuid::Uuid;

use super::dto::{CreateTask, TaskListParams, UpdateTask};
use super::model::{Task, UserRef};
use crate::progress::{ChecklistItem, TaskPriority, TaskStatus};

pub async fn create_task(
    pool: &PgPool,
    created_by: Uuid,
    payload: &CreateTask,
    progress: i32,
    status: TaskStatus,
) -> Result<Task> {
    let checklist = payload.todo_checklist.clone().unwrap_or_default();

    let task = sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks
            (id, title, description, status, priority, progress, due_date,
             created_by, assigned_to, todo_checklist, attachments)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(status)
    .bind(payload.priority.unwrap_or(TaskPriority::Medium))
    .bind(progress)
    .bind(payload.due_date)
    .bind(created_by)
    .bind(payload.assigned_to.clone().unwrap_or_default())
    .bind(sqlx::types::Json(checklist))
    .bind(payload.attachments.clone().unwrap_or_default())
    .fetch_one(pool)
    .await?;

    Ok(task)
}

pub async fn get_task(pool: &PgPool, id: Uuid) -> Result<Option<Task>> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Filtered, paginated task listing, newest first. Returns the page of
/// tasks plus the unpaginated match count.
pub async fn list_tasks(pool: &PgPool, params: &TaskListParams) -> Result<(Vec<Task>, i64)> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

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
    if params.search.is_some() {
        bind_count += 1;
        clauses.push(format!(
            "(title ILIKE ${0} OR description ILIKE ${0})",
            bind_count
        ));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let list_query = format!(
        "SELECT * FROM tasks{} ORDER BY created_at DESC LIMIT {} OFFSET {}",
        where_clause,
        limit,
        (page - 1) * limit
    );
    let count_query = format!("SELECT COUNT(*) FROM tasks{}", where_clause);

    let mut list_builder = sqlx::query_as::<_, Task>(&list_query);
    let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);

    // Binds must follow the clause order above
    if let Some(status) = params.status {
        list_builder = list_builder.bind(status);
        count_builder = count_builder.bind(status);
    }
    if let Some(priority) = params.priority {
        list_builder = list_builder.bind(priority);
        count_builder = count_builder.bind(priority);
    }
    if let Some(assigned_to) = params.assigned_to {
        list_builder = list_builder.bind(assigned_to);
        count_builder = count_builder.bind(assigned_to);
    }
    if let Some(created_by) = params.created_by {
        list_builder = list_builder.bind(created_by);
        count_builder = count_builder.bind(created_by);
    }
    if let Some(search) = &params.search {
        let pattern = format!("%{}%", search.trim());
        list_builder = list_builder.bind(pattern.clone());
        count_builder = count_builder.bind(pattern);
    }

    let tasks = list_builder.fetch_all(pool).await?;
    let count = count_builder.fetch_one(pool).await?;

    Ok((tasks, count))
}

/// Generic field update. Status, progress, checklist and created_by are
/// deliberately not reachable from here.
pub async fn update_task(pool: &PgPool, id: Uuid, payload: UpdateTask) -> Result<Task> {
    let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
    let mut bind_count = 1;

    if payload.title.is_some() {
        query.push_str(&format!(", title = ${}", bind_count));
        bind_count += 1;
    }
    if payload.description.is_some() {
        query.push_str(&format!(", description = ${}", bind_count));
        bind_count += 1;
    }
    if payload.priority.is_some() {
        query.push_str(&format!(", priority = ${}", bind_count));
        bind_count += 1;
    }
    if payload.due_date.is_some() {
        query.push_str(&format!(", due_date = ${}", bind_count));
        bind_count += 1;
    }
    if payload.assigned_to.is_some() {
        query.push_str(&format!(", assigned_to = ${}", bind_count));
        bind_count += 1;
    }
    if payload.attachments.is_some() {
        query.push_str(&format!(", attachments = ${}", bind_count));
        bind_count += 1;
    }

    query.push_str(&format!(" WHERE id = ${} RETURNING *", bind_count));

    let mut query_builder = sqlx::query_as::<_, Task>(&query);

    if let Some(title) = payload.title {
        query_builder = query_builder.bind(title);
    }
    if let Some(description) = payload.description {
        query_builder = query_builder.bind(description);
    }
    if let Some(priority) = payload.priority {
        query_builder = query_builder.bind(priority);
    }
    if let Some(due_date) = payload.due_date {
        query_builder = query_builder.bind(due_date);
    }
    if let Some(assigned_to) = payload.assigned_to {
        query_builder = query_builder.bind(assigned_to);
    }
    if let Some(attachments) = payload.attachments {
        query_builder = query_builder.bind(attachments);
    }

    query_builder.bind(id).fetch_one(pool).await
}

pub async fn delete_task(pool: &PgPool, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn set_progress(
    pool: &PgPool,
    id: Uuid,
    progress: i32,
    status: TaskStatus,
) -> Result<Task> {
    sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks
        SET progress = $2, status = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(progress)
    .bind(status)
    .fetch_one(pool)
    .await
}

/// Replace the checklist verbatim. The derived progress/status pair is
/// absent when the new checklist is empty, in which case both columns are
/// left as they were.
pub async fn set_checklist(
    pool: &PgPool,
    id: Uuid,
    checklist: Vec<ChecklistItem>,
    derived: Option<(i32, TaskStatus)>,
) -> Result<Task> {
    match derived {
        Some((progress, status)) => {
            sqlx::query_as::<_, Task>(
                r#"
                UPDATE tasks
                SET todo_checklist = $2, progress = $3, status = $4, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(sqlx::types::Json(checklist))
            .bind(progress)
            .bind(status)
            .fetch_one(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Task>(
                r#"
                UPDATE tasks
                SET todo_checklist = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(sqlx::types::Json(checklist))
            .fetch_one(pool)
            .await
        }
    }
}

/// Resolve user IDs to display references for populated responses
pub async fn user_refs(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<UserRef>> {
    sqlx::query_as::<_, UserRef>(
        "SELECT id, name, email, profile_image_url FROM users WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await
}

/// How many of the given user IDs actually exist
pub async fn count_users_in(pool: &PgPool, ids: &[Uuid]) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ANY($1)")
        .bind(ids)
        .fetch_one(pool)
        .await
}
