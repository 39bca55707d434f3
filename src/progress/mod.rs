use serde::{Deserialize, Serialize};

// Task lifecycle status, stored as a Postgres enum.
// JSON uses the display labels the dashboard expects ("In Progress", etc).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
pub enum TaskStatus {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl TaskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
pub enum TaskPriority {
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "High")]
    High,
}

impl TaskPriority {
    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }
}

// One sub-task of a checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    pub completed: bool,
}

/// Status is a pure function of progress: 0 is Pending, 100 is Completed,
/// anything in between is In Progress. Recomputed on every progress write,
/// so Completed is not terminal — lowering progress moves the task back.
pub fn status_for_progress(progress: i32) -> TaskStatus {
    if progress == 0 {
        TaskStatus::Pending
    } else if progress == 100 {
        TaskStatus::Completed
    } else {
        TaskStatus::InProgress
    }
}

/// Validate a client-supplied progress value before anything is written
pub fn validate_progress(progress: i32) -> Result<(), String> {
    if !(0..=100).contains(&progress) {
        return Err("Progress must be between 0 and 100".to_string());
    }
    Ok(())
}

/// Progress and status derived from a checklist. Returns None for an empty
/// checklist: clearing the list leaves progress/status untouched.
pub fn checklist_progress(items: &[ChecklistItem]) -> Option<(i32, TaskStatus)> {
    if items.is_empty() {
        return None;
    }

    let completed = items.iter().filter(|item| item.completed).count();
    let progress = round_percentage(completed, items.len());

    Some((progress, status_for_progress(progress)))
}

// Percentage rounded half away from zero, e.g. 1 of 3 -> 33, 2 of 3 -> 67
fn round_percentage(completed: usize, total: usize) -> i32 {
    (completed as f64 * 100.0 / total as f64).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(completed: bool) -> ChecklistItem {
        ChecklistItem {
            text: "step".to_string(),
            completed,
        }
    }

    #[test]
    fn test_status_derivation_boundaries() {
        assert_eq!(status_for_progress(0), TaskStatus::Pending);
        assert_eq!(status_for_progress(1), TaskStatus::InProgress);
        assert_eq!(status_for_progress(50), TaskStatus::InProgress);
        assert_eq!(status_for_progress(99), TaskStatus::InProgress);
        assert_eq!(status_for_progress(100), TaskStatus::Completed);
    }

    #[test]
    fn test_status_derivation_is_idempotent() {
        for p in 0..=100 {
            let first = status_for_progress(p);
            let second = status_for_progress(p);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_validate_progress_range() {
        assert!(validate_progress(0).is_ok());
        assert!(validate_progress(100).is_ok());
        assert!(validate_progress(57).is_ok());

        assert!(validate_progress(-1).is_err());
        assert!(validate_progress(101).is_err());
        assert_eq!(
            validate_progress(101).unwrap_err(),
            "Progress must be between 0 and 100"
        );
    }

    #[test]
    fn test_checklist_progress_rounding() {
        // 1 of 3 -> 33, 2 of 3 -> 67 (half away from zero)
        let one_of_three = vec![item(true), item(false), item(false)];
        assert_eq!(
            checklist_progress(&one_of_three),
            Some((33, TaskStatus::InProgress))
        );

        let two_of_three = vec![item(true), item(true), item(false)];
        assert_eq!(
            checklist_progress(&two_of_three),
            Some((67, TaskStatus::InProgress))
        );
    }

    #[test]
    fn test_checklist_progress_extremes() {
        let none_done = vec![item(false), item(false)];
        assert_eq!(
            checklist_progress(&none_done),
            Some((0, TaskStatus::Pending))
        );

        let all_done = vec![item(true), item(true), item(true)];
        assert_eq!(
            checklist_progress(&all_done),
            Some((100, TaskStatus::Completed))
        );
    }

    #[test]
    fn test_empty_checklist_leaves_progress_alone() {
        assert_eq!(checklist_progress(&[]), None);
    }

    #[test]
    fn test_checklist_progress_matches_status_rule() {
        for total in 1..=10usize {
            for done in 0..=total {
                let items: Vec<ChecklistItem> = (0..total).map(|i| item(i < done)).collect();
                let (progress, status) = checklist_progress(&items).unwrap();
                assert!((0..=100).contains(&progress));
                assert_eq!(status, status_for_progress(progress));
            }
        }
    }
}
