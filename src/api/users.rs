use reqwest::Method;

use super::{ApiClient, Host};
use crate::error::Result;
use crate::types::{UpdateProfileRequest, User};

impl ApiClient {
    /// Fetches a user profile by id. Works for the signed-in user and for
    /// other users (friend profiles) alike.
    pub async fn user_profile(&self, token: &str, user_id: u64) -> Result<User> {
        let path = format!("/users/{}", user_id);
        let request = self.request(Method::GET, Host::Api, &path, Some(token));
        self.execute(request, "Failed to fetch user profile").await
    }

    /// Updates the signed-in user's profile fields.
    pub async fn update_profile(
        &self,
        token: &str,
        user_id: u64,
        update: &UpdateProfileRequest,
    ) -> Result<User> {
        let path = format!("/users/{}", user_id);
        let request = self
            .request(Method::PUT, Host::Api, &path, Some(token))
            .json(update);
        self.execute(request, "Failed to update user profile").await
    }
}
