use serde::{Deserialize, Serialize};

/// A user profile as the backend returns it. The auth endpoints of the
/// backend capitalize field names (`ID`, `Username`, `Email`) while the rest
/// of the API uses lowercase; aliases accept both spellings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(alias = "ID")]
    pub id: u64,
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

/// An incoming friend request: the request id used to respond, plus the
/// sending user's profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FriendRequest {
    pub id: u64,
    pub sender: User,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    NotStarted,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorRole {
    Viewer,
    Editor,
}

/// A goal with its ordered steps and collaborators. Date fields are passed
/// through verbatim; their exact format is owned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Goal {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
    pub status: GoalStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    pub user_id: u64,
    #[serde(default)]
    pub steps: Vec<GoalStep>,
    #[serde(default)]
    pub collaborators: Vec<GoalCollaborator>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalStep {
    pub id: u64,
    pub goal_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: StepStatus,
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalCollaborator {
    pub user_id: u64,
    pub role: CollaboratorRole,
    pub user: User,
}

/// Pagination metadata returned alongside goal listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meta {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewGoalStep {
    pub title: String,
    pub description: String,
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewCollaborator {
    pub user_id: u64,
    pub role: CollaboratorRole,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateGoalRequest {
    pub name: String,
    pub category: String,
    pub description: String,
    pub due_date: String,
    pub steps: Vec<NewGoalStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborators: Option<Vec<NewCollaborator>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct UpdateGoalRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GoalStatus>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_accepts_capitalized_auth_fields() {
        let json = r#"{"ID": 7, "Username": "bob", "Email": "bob@example.com"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.username, "bob");
        assert_eq!(user.email, "bob@example.com");
        assert_eq!(user.role, "");
    }

    #[test]
    fn test_user_accepts_lowercase_fields() {
        let json = r#"{"id": 3, "username": "eve", "email": "eve@example.com", "role": "admin"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 3);
        assert_eq!(user.role, "admin");
    }

    #[test]
    fn test_goal_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&GoalStatus::NotStarted).unwrap(),
            "\"not_started\""
        );
        let status: GoalStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, GoalStatus::InProgress);
    }

    #[test]
    fn test_update_goal_request_omits_unset_fields() {
        let request = UpdateGoalRequest {
            status: Some(GoalStatus::Completed),
            ..Default::default()
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"status":"completed"}"#);
    }

    #[test]
    fn test_goal_tolerates_missing_optional_fields() {
        let json = r#"{
            "id": 1,
            "name": "Run a marathon",
            "status": "in_progress",
            "user_id": 42
        }"#;
        let goal: Goal = serde_json::from_str(json).unwrap();
        assert!(goal.steps.is_empty());
        assert!(goal.collaborators.is_empty());
        assert_eq!(goal.category, "");
    }
}
