use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::progress::{ChecklistItem, TaskPriority, TaskStatus};

#[derive(Debug, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub progress: i32,
    pub due_date: DateTime<Utc>,
    pub created_by: Uuid,
    pub assigned_to: Vec<Uuid>,
    pub todo_checklist: sqlx::types::Json<Vec<ChecklistItem>>,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// A user reference resolved for task payloads ("populate")
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub progress: i32,
    pub due_date: DateTime<Utc>,
    pub created_by: Option<UserRef>,
    pub assigned_to: Vec<UserRef>,
    pub todo_checklist: Vec<ChecklistItem>,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskResponse {
    /// Shape a task row for the wire, swapping user IDs for resolved
    /// references. Assignees missing from the map (deleted users) are
    /// dropped from the list rather than failing the response.
    pub fn build(task: Task, users: &HashMap<Uuid, UserRef>) -> Self {
        TaskResponse {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            progress: task.progress,
            due_date: task.due_date,
            created_by: users.get(&task.created_by).cloned(),
            assigned_to: task
                .assigned_to
                .iter()
                .filter_map(|id| users.get(id).cloned())
                .collect(),
            todo_checklist: task.todo_checklist.0,
            attachments: task.attachments,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub tasks: Vec<TaskResponse>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total_tasks: i64,
}
