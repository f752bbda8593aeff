//! Appwrite REST gateway
//!
//! Talks to an Appwrite-compatible endpoint over HTTPS with `reqwest`.
//! The session cookie handed out on sign-in is captured from the
//! `X-Fallback-Cookies` response header and replayed on every later request,
//! the same way the mobile SDKs do it. It lives only in memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::RwLock;
use std::time::Duration;
use url::Url;

use crate::config::GatewayConfig;
use crate::decode::{self, USER_FIELDS};
use crate::error::{normalize_message, GatewayError, Result};
use crate::gateway::query::{Query, CREATED_AT};
use crate::gateway::{unique_id, Gateway};
use crate::types::{Session, User, Video};

const FALLBACK_COOKIES: &str = "X-Fallback-Cookies";
const RESPONSE_FORMAT: &str = "1.6.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Largest page the document list endpoint hands out
const PAGE_SIZE: usize = 100;

/// Backend error types that carry a specific meaning for callers
const DUPLICATE_USER_TYPE: &str = "user_already_exists";
const INVALID_CREDENTIALS_TYPE: &str = "user_invalid_credentials";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default, rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(rename = "$id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "userId")]
    user_id: String,
    expire: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    documents: Vec<Value>,
}

/// Gateway backed by the Appwrite REST API
pub struct AppwriteGateway {
    http: reqwest::Client,
    base: Url,
    config: GatewayConfig,
    session_cookie: RwLock<Option<String>>,
}

impl AppwriteGateway {
    /// Create a gateway for the configured project
    ///
    /// # Errors
    ///
    /// Returns a config error if the endpoint is not a valid URL, or a
    /// network error if the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let base = config.endpoint_url()?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base,
            config: config.clone(),
            session_cookie: RwLock::new(None),
        })
    }

    /// Whether a session cookie has been captured
    pub fn has_session(&self) -> bool {
        self.session_cookie
            .read()
            .map(|cookie| cookie.is_some())
            .unwrap_or(false)
    }

    /// URL of the initials avatar the backend renders for `name`
    pub fn initials_avatar_url(&self, name: &str) -> Result<Url> {
        let mut url = self.endpoint("avatars/initials")?;
        url.query_pairs_mut()
            .append_pair("name", name)
            .append_pair("project", &self.config.project_id);
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| GatewayError::Network(format!("Invalid request path '{}': {}", path, e)).into())
    }

    fn collection_path(&self, collection_id: &str) -> String {
        format!(
            "databases/{}/collections/{}/documents",
            self.config.database_id, collection_id
        )
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        let mut builder = self
            .http
            .request(method, url)
            .header("X-Appwrite-Project", &self.config.project_id)
            .header("X-Appwrite-Response-Format", RESPONSE_FORMAT)
            .header("Origin", format!("appwrite-android://{}", self.config.platform));

        if let Ok(cookie) = self.session_cookie.read() {
            if let Some(cookie) = cookie.as_ref() {
                builder = builder.header(FALLBACK_COOKIES, cookie);
            }
        }

        Ok(builder)
    }

    fn remember_session(&self, response: &Response) {
        let cookie = response
            .headers()
            .get(FALLBACK_COOKIES)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty() && *v != "[]");

        if let Some(cookie) = cookie {
            if let Ok(mut slot) = self.session_cookie.write() {
                *slot = Some(cookie.to_string());
                tracing::debug!("Captured session cookie");
            }
        }
    }

    /// Send a request and return the raw response, with backend failures
    /// mapped onto the error taxonomy
    async fn execute(&self, builder: RequestBuilder, operation: &str) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!(operation, error = %e, "Gateway request failed");
            GatewayError::Network(normalize_message(&e.to_string()))
        })?;

        self.remember_session(&response);

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let error = map_error(status, &text);
        tracing::error!(operation, %status, error = %error, "Gateway returned an error");
        Err(error.into())
    }

    async fn execute_json<T: DeserializeOwned>(&self, builder: RequestBuilder, operation: &str) -> Result<T> {
        let response = self.execute(builder, operation).await?;
        response.json::<T>().await.map_err(|e| {
            GatewayError::Network(format!("Malformed {} response: {}", operation, e)).into()
        })
    }

    async fn list_documents(&self, collection_id: &str, queries: &[Query]) -> Result<Vec<Value>> {
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|q| ("queries[]", q.to_string()))
            .collect();

        let builder = self
            .request(Method::GET, &self.collection_path(collection_id))?
            .query(&params);

        let list: DocumentList = self.execute_json(builder, "list documents").await?;
        tracing::debug!(collection = collection_id, count = list.documents.len(), "Listed documents");
        Ok(list.documents)
    }

    async fn create_document(&self, collection_id: &str, data: Value) -> Result<Value> {
        let builder = self
            .request(Method::POST, &self.collection_path(collection_id))?
            .json(&json!({
                "documentId": unique_id(),
                "data": data,
            }));

        self.execute_json(builder, "create document").await
    }

    async fn create_profile(&self, account_id: &str, email: &str, user_name: &str) -> Result<User> {
        let avatar = self.initials_avatar_url(user_name)?;
        let doc = self
            .create_document(
                &self.config.user_collection_id,
                json!({
                    USER_FIELDS.account_id: account_id,
                    USER_FIELDS.email: email,
                    USER_FIELDS.user_name: user_name,
                    USER_FIELDS.avatar: avatar.as_str(),
                }),
            )
            .await?;

        Ok(decode::decode_user(&doc).map_err(GatewayError::from)?)
    }

    async fn list_videos_with(&self, queries: &[Query]) -> Result<Vec<Video>> {
        let docs = self
            .list_documents(&self.config.video_collection_id, queries)
            .await?;
        Ok(decode::decode_videos(&docs).map_err(GatewayError::from)?)
    }
}

/// Map a non-success response onto the gateway error taxonomy
fn map_error(status: StatusCode, body: &str) -> GatewayError {
    let (message, kind) = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => (normalize_message(&parsed.message), parsed.kind),
        Err(_) => {
            let fallback = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("Request failed").to_string()
            } else {
                normalize_message(body)
            };
            (fallback, String::new())
        }
    };

    match (status, kind.as_str()) {
        (_, DUPLICATE_USER_TYPE) | (StatusCode::CONFLICT, _) => GatewayError::DuplicateAccount(message),
        (_, INVALID_CREDENTIALS_TYPE) | (StatusCode::UNAUTHORIZED, _) => {
            GatewayError::InvalidCredentials(message)
        }
        (StatusCode::NOT_FOUND, _) => GatewayError::NotFound(message),
        (StatusCode::BAD_REQUEST, _) => GatewayError::Validation(message),
        _ => GatewayError::Network(message),
    }
}

#[async_trait]
impl Gateway for AppwriteGateway {
    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
        user_name: &str,
    ) -> Result<User> {
        let builder = self.request(Method::POST, "account")?.json(&json!({
            "userId": unique_id(),
            "email": email,
            "password": password.expose_secret(),
            "name": user_name,
        }));
        let account: AccountResponse = self.execute_json(builder, "create account").await?;
        tracing::info!(account_id = %account.id, "Account created");

        self.authenticate(email, password).await?;

        let profile = self.create_profile(&account.id, email, user_name).await;
        if profile.is_err() {
            tracing::warn!(account_id = %account.id, "Profile creation failed, dropping session");
            self.forget_session();
        }
        profile
    }

    async fn authenticate(&self, email: &str, password: &SecretString) -> Result<Session> {
        let builder = self.request(Method::POST, "account/sessions/email")?.json(&json!({
            "email": email,
            "password": password.expose_secret(),
        }));

        let session: SessionResponse = self.execute_json(builder, "create session").await?;
        tracing::info!(user_id = %session.user_id, "Session created");

        Ok(Session {
            id: session.id,
            user_id: session.user_id,
            expire: session.expire,
        })
    }

    async fn current_user(&self) -> Result<Option<User>> {
        let builder = self.request(Method::GET, "account")?;
        let account: AccountResponse = match self.execute_json(builder, "get account").await {
            Ok(account) => account,
            Err(crate::AoraError::Gateway(GatewayError::InvalidCredentials(_))) => {
                tracing::debug!("No active session");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let docs = self
            .list_documents(
                &self.config.user_collection_id,
                &[Query::equal(USER_FIELDS.account_id, &account.id)],
            )
            .await?;

        let doc = docs.first().ok_or_else(|| {
            GatewayError::NotFound(format!("No user profile for account {}", account.id))
        })?;

        Ok(Some(decode::decode_user(doc).map_err(GatewayError::from)?))
    }

    async fn list_videos(&self) -> Result<Vec<Video>> {
        self.list_videos_with(&[]).await
    }

    async fn latest_videos(&self, limit: usize) -> Result<Vec<Video>> {
        self.list_videos_with(&[Query::order_desc(CREATED_AT), Query::limit(limit)])
            .await
    }

    async fn search_videos(&self, query: &str) -> Result<Vec<Video>> {
        tracing::debug!(query, "Searching videos");
        self.list_videos_with(&[
            Query::order_desc(CREATED_AT),
            Query::search(decode::VIDEO_FIELDS.title, query),
        ])
        .await
    }

    async fn videos_by_user(&self, account_id: &str) -> Result<Vec<Video>> {
        // The creator is a relationship attribute, which the list endpoint
        // cannot filter on; walk the whole newest-first listing page by page
        // and keep the account's videos.
        let mut owned = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut queries = vec![Query::order_desc(CREATED_AT), Query::limit(PAGE_SIZE)];
            if let Some(last_id) = &cursor {
                queries.push(Query::cursor_after(last_id));
            }

            let page = self.list_videos_with(&queries).await?;
            let page_len = page.len();
            cursor = page.last().map(|v| v.id.clone());
            owned.extend(page.into_iter().filter(|v| v.user.account_id == account_id));

            if page_len < PAGE_SIZE || cursor.is_none() {
                break;
            }
        }

        tracing::debug!(account_id, count = owned.len(), "Listed videos by user");
        Ok(owned)
    }

    fn forget_session(&self) {
        if let Ok(mut slot) = self.session_cookie.write() {
            if slot.take().is_some() {
                tracing::debug!("Dropped session cookie");
            }
        }
    }

    fn name(&self) -> &str {
        "appwrite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    #[test]
    fn test_map_error_duplicate_by_type() {
        let body = r#"{"message":"AppwriteException: A user with the same id, email, or phone already exists in this project.","code":409,"type":"user_already_exists"}"#;
        match map_error(StatusCode::CONFLICT, body) {
            GatewayError::DuplicateAccount(m) => {
                assert!(m.starts_with("A user with the same id"));
            }
            other => panic!("Expected DuplicateAccount, got {:?}", other),
        }
    }

    #[test]
    fn test_map_error_invalid_credentials() {
        let body = r#"{"message":"Invalid credentials. Please check the email and password.","code":401,"type":"user_invalid_credentials"}"#;
        assert!(matches!(
            map_error(StatusCode::UNAUTHORIZED, body),
            GatewayError::InvalidCredentials(_)
        ));
    }

    #[test]
    fn test_map_error_not_found_and_bad_request() {
        let body = r#"{"message":"Collection not found","code":404,"type":"collection_not_found"}"#;
        assert_eq!(
            map_error(StatusCode::NOT_FOUND, body),
            GatewayError::NotFound("Collection not found".to_string())
        );

        let body = r#"{"message":"Invalid `password` param","code":400,"type":"general_argument_invalid"}"#;
        assert!(matches!(
            map_error(StatusCode::BAD_REQUEST, body),
            GatewayError::Validation(_)
        ));
    }

    #[test]
    fn test_map_error_non_json_body() {
        assert_eq!(
            map_error(StatusCode::BAD_GATEWAY, ""),
            GatewayError::Network("Bad Gateway".to_string())
        );
        assert_eq!(
            map_error(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded"),
            GatewayError::Network("upstream exploded".to_string())
        );
    }

    #[test]
    fn test_initials_avatar_url() {
        let config = Config::default_config();
        let gateway = AppwriteGateway::new(&config.gateway).unwrap();
        let url = gateway.initials_avatar_url("Jane Doe").unwrap();

        assert_eq!(url.path(), "/v1/avatars/initials");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("name".to_string(), "Jane Doe".to_string())));
        assert!(pairs.contains(&("project".to_string(), config.gateway.project_id.clone())));
    }

    #[test]
    fn test_collection_path() {
        let config = Config::default_config();
        let gateway = AppwriteGateway::new(&config.gateway).unwrap();
        assert_eq!(
            gateway.collection_path("videos"),
            format!("databases/{}/collections/videos/documents", config.gateway.database_id)
        );
        assert!(!gateway.has_session());
    }
}
