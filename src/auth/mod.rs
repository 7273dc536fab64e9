//! Authentication: login/register against the backend plus reading the
//! locally stored bearer token back into a user identity.
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio_rusqlite::Connection;

use crate::core::db::{self, ACCESS_TOKEN_KEY};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{detail}")]
    Api { status: u16, detail: String },
    #[error("Network error. Please check your connection and try again.")]
    Transport(#[source] reqwest::Error),
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// The backend's serialized identity record, persisted verbatim.
    pub user: Value,
}

#[derive(Clone, Debug)]
pub struct AuthClient {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            timeout,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        self.post_credentials(
            "/auth/login",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        self.post_credentials(
            "/auth/register",
            serde_json::json!({ "email": email, "username": username, "password": password }),
        )
        .await
    }

    async fn post_credentials(
        &self,
        endpoint: &str,
        payload: Value,
    ) -> Result<AuthResponse, AuthError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v["detail"].as_str().map(str::to_string))
                .unwrap_or_else(|| format!("Authentication failed with status {status}"));
            return Err(AuthError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        response.json().await.map_err(AuthError::Transport)
    }
}

/// Decodes the claims segment of a JWT without verifying the signature.
/// The client only reads the token back for display and request
/// attribution; verification is the backend's job. The backend issues
/// `user_id` as a database rowid, so a numeric claim is normalized to a
/// string.
pub fn decode_claims(token: &str) -> Option<UserIdentity> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;

    let user_id = match &claims["user_id"] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let email = claims["email"].as_str()?.to_string();
    let username = claims["username"].as_str()?.to_string();

    Some(UserIdentity {
        user_id,
        email,
        username,
    })
}

/// Reads the stored credential into an identity. Absent and malformed
/// tokens are treated identically: the caller sees `None`, never an
/// error.
pub async fn current_user(db: &Connection) -> Option<UserIdentity> {
    let token = match db::kv_get(db, ACCESS_TOKEN_KEY).await {
        Ok(Some(token)) => token,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Failed to read stored access token: {e}");
            return None;
        }
    };

    let user = decode_claims(&token);
    if user.is_none() {
        tracing::warn!("Stored access token is malformed; treating as signed out");
    }
    user
}

pub async fn current_user_id(db: &Connection) -> Option<String> {
    current_user(db).await.map(|u| u.user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(payload: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{payload}.fakesignature")
    }

    #[test]
    fn test_decode_claims_with_numeric_user_id() {
        let token = make_token(serde_json::json!({
            "user_id": 7,
            "email": "sam@example.com",
            "username": "sam",
            "exp": 4102444800u64,
            "iat": 1700000000u64,
        }));

        let user = decode_claims(&token).expect("Should decode");
        assert_eq!(user.user_id, "7");
        assert_eq!(user.email, "sam@example.com");
        assert_eq!(user.username, "sam");
    }

    #[test]
    fn test_decode_claims_with_string_user_id() {
        let token = make_token(serde_json::json!({
            "user_id": "abc",
            "email": "sam@example.com",
            "username": "sam",
        }));

        assert_eq!(decode_claims(&token).unwrap().user_id, "abc");
    }

    #[test]
    fn test_decode_claims_rejects_garbage() {
        assert_eq!(decode_claims("not-a-jwt"), None);
        assert_eq!(decode_claims("a.b.c"), None);
        assert_eq!(decode_claims(""), None);

        // Valid base64 but missing claims
        let token = make_token(serde_json::json!({ "email": "sam@example.com" }));
        assert_eq!(decode_claims(&token), None);
    }

    #[tokio::test]
    async fn test_current_user_absent_token() {
        let dir = tempfile::tempdir().unwrap();
        let db = db::async_db(dir.path().to_str().unwrap()).await.unwrap();

        assert_eq!(current_user(&db).await, None);
        assert_eq!(current_user_id(&db).await, None);
    }

    #[tokio::test]
    async fn test_current_user_malformed_token_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let db = db::async_db(dir.path().to_str().unwrap()).await.unwrap();
        db::kv_set(&db, ACCESS_TOKEN_KEY, "garbage").await.unwrap();

        assert_eq!(current_user(&db).await, None);
    }

    #[tokio::test]
    async fn test_current_user_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = db::async_db(dir.path().to_str().unwrap()).await.unwrap();
        let token = make_token(serde_json::json!({
            "user_id": 7,
            "email": "sam@example.com",
            "username": "sam",
        }));
        db::kv_set(&db, ACCESS_TOKEN_KEY, &token).await.unwrap();

        assert_eq!(current_user_id(&db).await.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/login")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "email": "sam@example.com",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "access_token": "header.payload.sig",
                    "user": {"id": 7, "email": "sam@example.com", "username": "sam"}
                }"#,
            )
            .create();

        let client = AuthClient::new(&server.url());
        let response = client.login("sam@example.com", "hunter2").await.unwrap();

        mock.assert();
        assert_eq!(response.access_token, "header.payload.sig");
        assert_eq!(response.user["username"], "sam");
    }

    #[tokio::test]
    async fn test_login_rejection_surfaces_detail() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"detail": "Invalid email or password"}"#)
            .create();

        let client = AuthClient::new(&server.url());
        let result = client.login("sam@example.com", "wrong").await;

        match result {
            Err(AuthError::Api { status, detail }) => {
                assert_eq!(status, 401);
                assert_eq!(detail, "Invalid email or password");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }
}
