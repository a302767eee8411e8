//! Client for the cooperative's REST backend
//!
//! Fetches the lot, organization, sample and process collections (plus the
//! activity collections used for accounting) and normalizes paginated and
//! bare-array payloads into plain record lists.

use std::sync::Arc;

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    decode_records, normalize_collection, ActivityKind, ActivityRecord, CollectionShape, Lot,
    Organization, Process, Sample,
};
use tokio::sync::Mutex;

use crate::config::UpstreamConfig;
use crate::error::{AppError, AppResult};
use crate::services::snapshot::{Snapshot, SnapshotSource};

pub const LOTS_PATH: &str = "lotes/";
pub const ORGANIZATIONS_PATH: &str = "organizaciones/";
pub const SAMPLES_PATH: &str = "muestras/";
pub const PROCESSES_PATH: &str = "procesos/";

/// How requests to the upstream are authenticated
#[derive(Debug, Clone)]
pub enum Credentials {
    /// A long-lived bearer token
    Token(String),
    /// Username/password exchanged at the token endpoint
    Login { username: String, password: String },
    Anonymous,
}

/// Upstream API client
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    token_path: String,
    credentials: Credentials,
    include_activity: bool,
    /// Access token obtained through `Credentials::Login`
    session: Arc<Mutex<Option<String>>>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenPair {
    access: String,
    #[allow(dead_code)]
    #[serde(default)]
    refresh: Option<String>,
}

impl UpstreamClient {
    /// Create a client from configuration
    pub fn from_config(config: &UpstreamConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let credentials = match (&config.token, &config.username, &config.password) {
            (Some(token), _, _) if !token.is_empty() => Credentials::Token(token.clone()),
            (_, Some(username), Some(password)) => Credentials::Login {
                username: username.clone(),
                password: password.clone(),
            },
            _ => Credentials::Anonymous,
        };

        Ok(Self::with_client(client, config.base_url.clone(), credentials)
            .with_token_path(config.token_path.clone())
            .with_activity(config.include_activity))
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: String, credentials: Credentials) -> Self {
        Self::with_client(Client::new(), base_url, credentials)
    }

    fn with_client(client: Client, base_url: String, credentials: Credentials) -> Self {
        Self {
            client,
            base_url,
            token_path: "token/".to_string(),
            credentials,
            include_activity: true,
            session: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_token_path(mut self, token_path: String) -> Self {
        self.token_path = token_path;
        self
    }

    pub fn with_activity(mut self, include_activity: bool) -> Self {
        self.include_activity = include_activity;
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Bearer token for the next request, logging in when needed
    async fn bearer(&self) -> AppResult<Option<String>> {
        match &self.credentials {
            Credentials::Anonymous => Ok(None),
            Credentials::Token(token) => Ok(Some(token.clone())),
            Credentials::Login { username, password } => {
                let mut session = self.session.lock().await;
                if let Some(token) = session.as_ref() {
                    if !access_token_expired(token, Utc::now().timestamp()) {
                        return Ok(Some(token.clone()));
                    }
                    tracing::debug!("Upstream access token expired, logging in again");
                }
                let token = self.login(username, password).await?;
                *session = Some(token.clone());
                Ok(Some(token))
            }
        }
    }

    async fn login(&self, username: &str, password: &str) -> AppResult<String> {
        let response = self
            .client
            .post(self.url(&self.token_path))
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("login request failed: {}", e)))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AppError::UpstreamUnauthorized);
            }
            status => {
                return Err(AppError::UpstreamStatus {
                    status: status.as_u16(),
                    path: self.token_path.clone(),
                });
            }
        }

        let tokens: TokenPair = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("invalid token response: {}", e)))?;

        tracing::info!("Logged in to upstream as {}", username);
        Ok(tokens.access)
    }

    /// GET a path and return the raw JSON payload
    pub async fn fetch_payload(&self, path: &str) -> AppResult<Value> {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = self.bearer().await? {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("GET {} failed: {}", path, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            // Force a fresh login on the next cycle
            self.session.lock().await.take();
            return Err(AppError::UpstreamUnauthorized);
        }
        if !status.is_success() {
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("invalid JSON from {}: {}", path, e)))
    }

    /// Fetch a collection, normalizing `{results: [...]}` and bare arrays
    pub async fn fetch_collection<T: DeserializeOwned>(&self, path: &str) -> AppResult<Vec<T>> {
        let payload = self.fetch_payload(path).await?;
        let (items, shape) = normalize_collection(payload);
        if shape == CollectionShape::Unrecognized {
            tracing::warn!(path, "Unrecognized collection shape, treating as empty");
        }

        let decoded = decode_records::<T>(items);
        if decoded.skipped > 0 {
            tracing::warn!(path, skipped = decoded.skipped, "Dropped malformed records");
        }
        tracing::debug!(path, count = decoded.records.len(), "Fetched collection");

        Ok(decoded.records)
    }

    async fn fetch_activity_kind(&self, kind: ActivityKind) -> AppResult<Vec<ActivityRecord>> {
        let records = self.fetch_collection::<ActivityRecord>(kind.endpoint()).await?;
        Ok(records.into_iter().map(|r| r.with_kind(kind)).collect())
    }

    /// Tasks, unloadings and machinery usage, all or nothing
    pub async fn fetch_activity(&self) -> AppResult<Vec<ActivityRecord>> {
        if !self.include_activity {
            return Ok(Vec::new());
        }

        let (mut tasks, unloadings, usage) = tokio::try_join!(
            self.fetch_activity_kind(ActivityKind::Task),
            self.fetch_activity_kind(ActivityKind::Unloading),
            self.fetch_activity_kind(ActivityKind::MachineryUsage),
        )?;
        tasks.extend(unloadings);
        tasks.extend(usage);
        Ok(tasks)
    }
}

#[axum::async_trait]
impl SnapshotSource for UpstreamClient {
    async fn fetch_snapshot(&self) -> AppResult<Snapshot> {
        // Fan out; the first failure aborts the whole refresh
        let (organizations, lots, samples, processes, activity) = tokio::try_join!(
            self.fetch_collection::<Organization>(ORGANIZATIONS_PATH),
            self.fetch_collection::<Lot>(LOTS_PATH),
            self.fetch_collection::<Sample>(SAMPLES_PATH),
            self.fetch_collection::<Process>(PROCESSES_PATH),
            self.fetch_activity(),
        )?;

        Ok(Snapshot::new(
            Utc::now(),
            organizations,
            lots,
            samples,
            processes,
            activity,
        ))
    }
}

/// Whether a JWT access token is expired (with 30s leeway) at `now`.
///
/// Only the `exp` claim is read; the signature belongs to the upstream and
/// is not ours to verify. Opaque tokens are assumed valid.
pub fn access_token_expired(token: &str, now: i64) -> bool {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[derive(Deserialize)]
    struct ExpiryClaim {
        exp: i64,
    }

    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;

    match decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data.claims.exp <= now + 30,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_expiring_at(exp: i64) -> String {
        encode(
            &Header::default(),
            &serde_json::json!({ "exp": exp, "user_id": 1 }),
            &EncodingKey::from_secret(b"upstream-secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_access_token_expiry() {
        let now = 1_700_000_000;
        assert!(!access_token_expired(&token_expiring_at(now + 3600), now));
        assert!(access_token_expired(&token_expiring_at(now + 10), now));
        assert!(access_token_expired(&token_expiring_at(now - 10), now));
        assert!(!access_token_expired("opaque-token", now));
    }

    #[test]
    fn test_url_joining() {
        let client = UpstreamClient::with_base_url("http://api.local/api/".to_string(), Credentials::Anonymous);
        assert_eq!(client.url("/lotes/"), "http://api.local/api/lotes/");
        assert_eq!(client.url(LOTS_PATH), "http://api.local/api/lotes/");
    }
}
