//! HTTP client for the remote auth service.
//!
//! One method per endpoint, JSON bodies, typed errors. The bearer token
//! for authenticated calls is an explicit argument - there is no global
//! header state on the client.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::models::{AuthResponse, Profile};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Auth API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    /// Create a new client against the given server base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Register a new account; returns a token on success.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        self.post(
            "/api/auth/register",
            &json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    /// Exchange email/password credentials for a token.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.post(
            "/api/auth/login",
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Request a one-time code for a phone number.
    /// Does not authenticate; the code is dispatched out of band.
    pub async fn register_phone(&self, phone: &str) -> Result<(), ApiError> {
        self.post_empty("/api/auth/phone/register", &json!({ "phone": phone }))
            .await
    }

    /// Exchange a phone number and one-time code for a token.
    pub async fn verify_otp(&self, phone: &str, code: &str) -> Result<AuthResponse, ApiError> {
        self.post(
            "/api/auth/phone/verify",
            &json!({ "phone": phone, "code": code }),
        )
        .await
    }

    /// Request a password-reset link for an email address.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        self.post_empty("/api/auth/forgot", &json!({ "email": email }))
            .await
    }

    /// Set a new password using a reset link id.
    pub async fn reset_password(&self, reset_id: &str, password: &str) -> Result<(), ApiError> {
        let path = format!("/api/auth/reset/{}", reset_id);
        self.post_empty(&path, &json!({ "password": password }))
            .await
    }

    /// Fetch the profile for the given bearer token.
    pub async fn fetch_profile(&self, token: &str) -> Result<Profile, ApiError> {
        let url = format!("{}/api/auth/me", self.base_url);

        let response = self.client.get(&url).bearer_auth(token).send().await?;
        let response = Self::check_response(response).await?;

        debug!("Profile response received");
        Ok(response.json().await?)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.post(&url).json(body).send().await?;
        let response = Self::check_response(response).await?;

        Ok(response.json().await?)
    }

    async fn post_empty<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.post(&url).json(body).send().await?;
        Self::check_response(response).await?;

        Ok(())
    }

    /// Check if response is successful, classifying the body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_response(status, &body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = AuthClient::new("https://api.example.com/").expect("client build failed");
        assert_eq!(client.base_url(), "https://api.example.com");
    }
}
