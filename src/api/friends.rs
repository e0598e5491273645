use reqwest::Method;
use serde::Serialize;

use super::{ApiClient, Host};
use crate::error::Result;
use crate::types::{FriendRequest, User};

#[derive(Serialize)]
struct RespondBody {
    accept: bool,
}

impl ApiClient {
    /// Fetches the signed-in user's friends.
    pub async fn friends(&self, token: &str) -> Result<Vec<User>> {
        let request = self.request(Method::GET, Host::Api, "/friends", Some(token));
        self.execute(request, "Failed to fetch friends list").await
    }

    /// Sends a friend request to another user.
    pub async fn send_friend_request(&self, token: &str, user_id: u64) -> Result<()> {
        tracing::debug!(
            target: "stride::api::friends",
            "Sending friend request to user {}",
            user_id
        );

        let path = format!("/friends/{}/request", user_id);
        let request = self.request(Method::POST, Host::Api, &path, Some(token));
        self.execute_empty(request, "Failed to send friend request")
            .await
    }

    /// Fetches incoming friend requests.
    pub async fn friend_requests(&self, token: &str) -> Result<Vec<FriendRequest>> {
        let request = self.request(Method::GET, Host::Api, "/friends/requests", Some(token));
        self.execute(request, "Failed to fetch friend requests")
            .await
    }

    /// Accepts or declines an incoming friend request.
    pub async fn respond_to_friend_request(
        &self,
        token: &str,
        request_id: u64,
        accept: bool,
    ) -> Result<()> {
        let path = format!("/friends/requests/{}/respond", request_id);
        let request = self
            .request(Method::POST, Host::Api, &path, Some(token))
            .json(&RespondBody { accept });
        self.execute_empty(request, "Failed to respond to friend request")
            .await
    }

    /// Removes a friend.
    pub async fn remove_friend(&self, token: &str, friend_id: u64) -> Result<()> {
        let path = format!("/friends/{}", friend_id);
        let request = self.request(Method::DELETE, Host::Api, &path, Some(token));
        self.execute_empty(request, "Failed to remove friend").await
    }
}
