pub mod routes;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::progress::{TaskPriority, TaskStatus};
use crate::reports::{ExportTask, TaskSnapshot};
use crate::routes::tasks::model::{Task, UserRef};

// Report scope: a user (creator or assignee) and/or a created_at range
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportParams {
    pub user_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportParams {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

// HELPER FUNCTIONS

pub fn snapshot(task: &Task) -> TaskSnapshot {
    TaskSnapshot {
        status: task.status,
        priority: task.priority,
        progress: task.progress,
        due_date: task.due_date,
    }
}

/// Flatten a task row plus resolved users into the export input shape.
/// A missing creator renders as an empty name, missing assignees are
/// skipped, matching how populated references degrade elsewhere.
pub fn export_task(task: &Task, users: &HashMap<Uuid, UserRef>) -> ExportTask {
    ExportTask {
        title: task.title.clone(),
        description: task.description.clone(),
        status: task.status,
        priority: task.priority,
        progress: task.progress,
        due_date: task.due_date,
        created_by: users
            .get(&task.created_by)
            .map(|u| u.name.clone())
            .unwrap_or_default(),
        assigned_to: task
            .assigned_to
            .iter()
            .filter_map(|id| users.get(id).map(|u| u.name.clone()))
            .collect(),
        created_at: task.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task_row(created_by: Uuid, assigned_to: Vec<Uuid>) -> Task {
        let when = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        Task {
            id: Uuid::new_v4(),
            title: "write report".to_string(),
            description: None,
            status: TaskStatus::InProgress,
            priority: TaskPriority::High,
            progress: 40,
            due_date: when,
            created_by,
            assigned_to,
            todo_checklist: sqlx::types::Json(vec![]),
            attachments: vec![],
            created_at: when,
            updated_at: when,
        }
    }

    fn user_ref(id: Uuid, name: &str) -> UserRef {
        UserRef {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name),
            profile_image_url: None,
        }
    }

    #[test]
    fn test_export_task_resolves_names() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let task = task_row(creator, vec![assignee]);

        let mut users = HashMap::new();
        users.insert(creator, user_ref(creator, "alice"));
        users.insert(assignee, user_ref(assignee, "bob"));

        let export = export_task(&task, &users);
        assert_eq!(export.created_by, "alice");
        assert_eq!(export.assigned_to, vec!["bob".to_string()]);
    }

    #[test]
    fn test_export_task_tolerates_missing_users() {
        let task = task_row(Uuid::new_v4(), vec![Uuid::new_v4()]);
        let export = export_task(&task, &HashMap::new());

        assert_eq!(export.created_by, "");
        assert!(export.assigned_to.is_empty());
    }

    #[test]
    fn test_snapshot_carries_report_fields() {
        let task = task_row(Uuid::new_v4(), vec![]);
        let snap = snapshot(&task);

        assert_eq!(snap.status, TaskStatus::InProgress);
        assert_eq!(snap.priority, TaskPriority::High);
        assert_eq!(snap.progress, 40);
        assert_eq!(snap.due_date, task.due_date);
    }
}
