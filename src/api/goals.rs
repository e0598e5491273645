use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiClient, DataEnvelope, Host};
use crate::error::Result;
use crate::types::{CreateGoalRequest, Goal, GoalStep, Meta, UpdateGoalRequest};

/// One page of goals plus pagination metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct GoalPage {
    pub data: Vec<Goal>,
    pub meta: Meta,
}

#[derive(Serialize)]
struct ProgressBody<'a> {
    step: &'a str,
    done: bool,
}

impl ApiClient {
    /// Fetches a page of the signed-in user's goals.
    pub async fn list_goals(
        &self,
        token: &str,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<GoalPage> {
        let mut request = self.request(Method::GET, Host::Api, "/goals", Some(token));
        if let Some(page) = page {
            request = request.query(&[("page", page)]);
        }
        if let Some(per_page) = per_page {
            request = request.query(&[("per_page", per_page)]);
        }
        self.execute(request, "Failed to fetch goals").await
    }

    /// Creates a goal with its steps and optional collaborators.
    pub async fn create_goal(&self, token: &str, goal: &CreateGoalRequest) -> Result<Goal> {
        let request = self
            .request(Method::POST, Host::Api, "/goals", Some(token))
            .json(goal);
        let envelope: DataEnvelope<Goal> =
            self.execute(request, "Failed to create goal").await?;
        Ok(envelope.data)
    }

    /// Fetches one goal with steps and collaborators.
    pub async fn goal(&self, token: &str, goal_id: u64) -> Result<Goal> {
        let path = format!("/goals/{}", goal_id);
        let request = self.request(Method::GET, Host::Api, &path, Some(token));
        let envelope: DataEnvelope<Goal> = self.execute(request, "Failed to fetch goal").await?;
        Ok(envelope.data)
    }

    /// Updates a goal's fields.
    pub async fn update_goal(
        &self,
        token: &str,
        goal_id: u64,
        update: &UpdateGoalRequest,
    ) -> Result<Goal> {
        let path = format!("/goals/{}", goal_id);
        let request = self
            .request(Method::PUT, Host::Api, &path, Some(token))
            .json(update);
        let envelope: DataEnvelope<Goal> =
            self.execute(request, "Failed to update goal").await?;
        Ok(envelope.data)
    }

    /// Deletes a goal.
    pub async fn delete_goal(&self, token: &str, goal_id: u64) -> Result<()> {
        let path = format!("/goals/{}", goal_id);
        let request = self.request(Method::DELETE, Host::Api, &path, Some(token));
        self.execute_empty(request, "Failed to delete goal").await
    }

    /// Toggles one step's completion. The backend addresses steps by title
    /// and takes a boolean rather than the step status enum.
    pub async fn update_goal_step(
        &self,
        token: &str,
        goal_id: u64,
        step_title: &str,
        done: bool,
    ) -> Result<GoalStep> {
        let path = format!("/goals/{}/progress", goal_id);
        let request = self
            .request(Method::PATCH, Host::Api, &path, Some(token))
            .json(&ProgressBody {
                step: step_title,
                done,
            });
        let envelope: DataEnvelope<GoalStep> = self
            .execute(request, "Failed to update step status")
            .await?;
        Ok(envelope.data)
    }
}
