use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiClient, Host};
use crate::error::Result;
use crate::types::User;

/// Successful login payload: the bearer token for subsequent requests plus
/// the authenticated user's profile snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    email: &'a str,
    hashed_password: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// Registers a new user account.
    ///
    /// The backend expects the password under the `hashed_password` key; the
    /// name is the server's, the value is the plain password (hashing happens
    /// server-side).
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        tracing::debug!(
            target: "stride::api::auth",
            "Registering user: {} ({})",
            username,
            email
        );

        let body = RegisterBody {
            username,
            email,
            hashed_password: password,
        };
        let request = self
            .request(Method::POST, Host::Api, "/users/register", None)
            .json(&body);
        self.execute(request, "Registration failed").await
    }

    /// Exchanges credentials for a bearer token and profile snapshot.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        tracing::debug!(
            target: "stride::api::auth",
            "Logging in: {}",
            email
        );

        let body = LoginBody { email, password };
        let request = self
            .request(Method::POST, Host::Api, "/users/login", None)
            .json(&body);
        self.execute(request, "Login failed").await
    }
}
