//! HTTP client implementation for the Garmin Connect API.
//!
//! This module provides a reqwest-based implementation of the
//! [`GarminApi`](crate::GarminApi) trait. The sign-in endpoint exchanges
//! email + password for a session token which is then sent as a bearer
//! header on every authenticated request.

use crate::retry::RetryPolicy;
use crate::{Activity, ActivityDetail, GarminApi, GarminError, UserProfile};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Client for the Garmin Connect API using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestGarminClient {
    base_url: String,
    email: String,
    password: SecretString,
    session: Arc<RwLock<Option<SecretString>>>,
    retry: RetryPolicy,
    client: reqwest::Client,
}

#[derive(serde::Deserialize)]
struct SigninResponse {
    token: String,
}

impl ReqwestGarminClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the API (e.g., "https://connectapi.garmin.com")
    /// * `email` - The account email used to sign in
    /// * `password` - The account password
    pub fn new(base_url: &str, email: impl Into<String>, password: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("reqwest client build should not fail");
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.into(),
            password,
            session: Arc::new(RwLock::new(None)),
            retry: RetryPolicy::default(),
            client,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Current session token, or a `Config` error when `login()` has not
    /// been called yet.
    async fn session_token(&self) -> Result<SecretString, GarminError> {
        self.session.read().await.clone().ok_or_else(|| {
            GarminError::Config("not signed in: call login() before authenticated requests".into())
        })
    }

    /// Build an authenticated GET request.
    async fn get_request(&self, url: &str) -> Result<reqwest::RequestBuilder, GarminError> {
        let token = self.session_token().await?;
        Ok(self.client.get(url).bearer_auth(token.expose_secret()))
    }

    /// Execute a request and expect a JSON response.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GarminError> {
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(error_from_response(resp).await);
        }
        // Read the body as text first so a shape mismatch reports a snippet
        // of what the server actually sent.
        let text = resp.text().await?;
        serde_json::from_str::<T>(&text).map_err(|e| {
            let body_snippet: String = text.chars().take(256).collect();
            GarminError::Decode(format!("{} - body: {}", e, body_snippet))
        })
    }
}

/// Extract error information from a failed response.
async fn error_from_response(resp: reqwest::Response) -> GarminError {
    let status = resp.status().as_u16();
    let retry_after = resp
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());
    let body = resp.text().await.unwrap_or_default();
    let body_snippet: String = body.chars().take(256).collect();

    match status {
        401 | 403 => GarminError::Auth(body_snippet),
        404 => GarminError::NotFound(body_snippet),
        429 => GarminError::RateLimited { retry_after },
        _ => GarminError::Api {
            status,
            body: body_snippet,
        },
    }
}

#[async_trait]
impl GarminApi for ReqwestGarminClient {
    async fn login(&self) -> Result<(), GarminError> {
        let url = format!("{}/signin", self.base_url);
        let body = serde_json::json!({
            "email": self.email,
            "password": self.password.expose_secret(),
        });
        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let text = resp.text().await?;
        let signin: SigninResponse = serde_json::from_str(&text).map_err(|e| {
            let body_snippet: String = text.chars().take(256).collect();
            GarminError::Decode(format!("decoding signin: {} - body: {}", e, body_snippet))
        })?;
        *self.session.write().await = Some(SecretString::new(signin.token.into()));
        tracing::debug!("signed in to Garmin Connect");
        Ok(())
    }

    async fn get_user_profile(&self) -> Result<UserProfile, GarminError> {
        let url = format!("{}/userprofile-service/socialProfile", self.base_url);
        self.execute_json(self.get_request(&url).await?).await
    }

    async fn get_activities(
        &self,
        start: u32,
        limit: u32,
    ) -> Result<Vec<Activity>, GarminError> {
        let url = format!(
            "{}/activitylist-service/activities/search/activities",
            self.base_url
        );
        let pairs = [("start", start.to_string()), ("limit", limit.to_string())];
        self.execute_json(self.get_request(&url).await?.query(&pairs))
            .await
    }

    async fn get_all_activities(
        &self,
        page_size: u32,
        max: Option<u32>,
    ) -> Result<Vec<Activity>, GarminError> {
        if page_size == 0 {
            return Err(GarminError::Config("page_size must be nonzero".into()));
        }
        let mut all: Vec<Activity> = Vec::new();
        let mut start = 0u32;
        loop {
            let page = self
                .retry
                .retry_async(move || self.get_activities(start, page_size))
                .await?;
            let page_len = page.len();
            tracing::debug!(start, page_len, "fetched activity page");
            all.extend(page);

            if let Some(max) = max
                && all.len() as u32 >= max
            {
                all.truncate(max as usize);
                break;
            }
            if (page_len as u32) < page_size {
                break;
            }
            start += page_size;
        }
        Ok(all)
    }

    async fn get_activity_detail(
        &self,
        activity_id: i64,
    ) -> Result<ActivityDetail, GarminError> {
        let url = format!("{}/activity-service/activity/{}", self.base_url, activity_id);
        self.execute_json(self.get_request(&url).await?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn authenticated_request_before_login_is_config_error() {
        let client = ReqwestGarminClient::new(
            "http://localhost",
            "athlete@example.com",
            SecretString::new("pw".into()),
        );
        let err = client.get_user_profile().await.unwrap_err();
        assert!(matches!(err, GarminError::Config(_)));
    }

    #[tokio::test]
    async fn zero_page_size_rejected() {
        let client = ReqwestGarminClient::new(
            "http://localhost",
            "athlete@example.com",
            SecretString::new("pw".into()),
        );
        let err = client.get_all_activities(0, None).await.unwrap_err();
        assert!(matches!(err, GarminError::Config(_)));
    }

    #[test]
    fn debug_output_hides_password() {
        let client = ReqwestGarminClient::new(
            "http://localhost",
            "athlete@example.com",
            SecretString::new("hunter2".into()),
        );
        let dbg = format!("{:?}", client);
        assert!(!dbg.contains("hunter2"));
    }
}
