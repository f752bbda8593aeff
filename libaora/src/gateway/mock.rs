//! Mock gateway implementation for testing
//!
//! An in-memory gateway with seeded accounts and videos. It can inject
//! failures and latency, and records every call, so services and fetch
//! controllers can be exercised without a backend.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

use crate::error::{GatewayError, Result};
use crate::gateway::{unique_id, Gateway};
use crate::types::{Session, User, Video};

const DUPLICATE_MESSAGE: &str =
    "A user with the same id, email, or phone already exists in this project.";
const INVALID_CREDENTIALS_MESSAGE: &str =
    "Invalid credentials. Please check the email and password.";

#[derive(Debug, Clone)]
struct MockAccount {
    email: String,
    password: String,
    user: User,
}

#[derive(Debug, Default)]
struct MockState {
    accounts: Vec<MockAccount>,
    /// Oldest first; "latest" queries read from the back
    videos: Vec<Video>,
    session: Option<Session>,
    /// Failures returned by the next calls, one per call
    queued_failures: VecDeque<GatewayError>,
    /// Failures returned by the next call of a named operation
    operation_failures: Vec<(String, GatewayError)>,
    /// Failure returned by every call while set
    fail_with: Option<GatewayError>,
    delay: Duration,
    calls: Vec<String>,
}

/// Mock gateway for testing
///
/// Cloning yields a handle onto the same in-memory state.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
}

impl MockGateway {
    /// Create an empty mock gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock gateway pre-filled with `videos` (oldest first)
    pub fn with_videos(videos: Vec<Video>) -> Self {
        let gateway = Self::new();
        gateway.lock().videos = videos;
        gateway
    }

    /// Register an account without going through `create_account`
    pub fn add_account(&self, email: &str, password: &str, user: User) {
        self.lock().accounts.push(MockAccount {
            email: email.to_string(),
            password: password.to_string(),
            user,
        });
    }

    /// Append a video as the newest one
    pub fn push_video(&self, video: Video) {
        self.lock().videos.push(video);
    }

    /// Make every call fail with `error` until cleared
    pub fn fail_with(&self, error: GatewayError) {
        self.lock().fail_with = Some(error);
    }

    /// Stop failing every call
    pub fn clear_failure(&self) {
        self.lock().fail_with = None;
    }

    /// Make the next call fail with `error`
    pub fn queue_failure(&self, error: GatewayError) {
        self.lock().queued_failures.push_back(error);
    }

    /// Make the next call of `operation` (e.g. `current_user`) fail with `error`
    pub fn queue_failure_on(&self, operation: &str, error: GatewayError) {
        self.lock()
            .operation_failures
            .push((operation.to_string(), error));
    }

    /// Delay every call (simulates network latency)
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = delay;
    }

    /// Number of times `operation` was called
    pub fn call_count(&self, operation: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.as_str() == operation).count()
    }

    /// All recorded calls in order, e.g. `search_videos:sunset`
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// The active session, if any
    pub fn session(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    /// Number of registered accounts
    pub fn account_count(&self) -> usize {
        self.lock().accounts.len()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call, wait out the configured delay, and return an
    /// injected failure if one is due
    async fn enter(&self, operation: &str, detail: Option<&str>) -> Result<()> {
        let (delay, failure) = {
            let mut state = self.lock();
            let entry = match detail {
                Some(detail) => format!("{}:{}", operation, detail),
                None => operation.to_string(),
            };
            state.calls.push(entry);
            let targeted = state
                .operation_failures
                .iter()
                .position(|(op, _)| op == operation)
                .map(|index| state.operation_failures.remove(index).1);
            let failure = targeted
                .or_else(|| state.queued_failures.pop_front())
                .or_else(|| state.fail_with.clone());
            (state.delay, failure)
        };

        if !delay.is_zero() {
            sleep(delay).await;
        }

        match failure {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    fn newest_first(&self) -> Vec<Video> {
        self.lock().videos.iter().rev().cloned().collect()
    }
}

/// Build a user with a predictable avatar URL, handy for seeding
pub fn mock_user(account_id: &str, user_name: &str) -> User {
    User {
        account_id: account_id.to_string(),
        user_name: user_name.to_string(),
        email: format!("{}@example.com", user_name),
        avatar: avatar_url(user_name),
    }
}

/// Build a video owned by `user`, handy for seeding
pub fn mock_video(id: &str, title: &str, user: &User) -> Video {
    Video {
        id: id.to_string(),
        title: title.to_string(),
        thumbnail: media_url(&format!("thumbnails/{}.png", id)),
        prompt: format!("Prompt for {}", title),
        video: media_url(&format!("videos/{}.mp4", id)),
        user: user.clone(),
    }
}

fn media_url(path: &str) -> Url {
    let mut url = Url::parse("https://mock.aora.local/").expect("static mock URL is valid");
    url.set_path(path);
    url
}

fn avatar_url(name: &str) -> Url {
    let mut url = media_url("avatars/initials");
    url.query_pairs_mut().append_pair("name", name);
    url
}

#[async_trait]
impl Gateway for MockGateway {
    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
        user_name: &str,
    ) -> Result<User> {
        self.enter("create_account", Some(email)).await?;

        let mut state = self.lock();
        if state.accounts.iter().any(|a| a.email == email) {
            return Err(GatewayError::DuplicateAccount(DUPLICATE_MESSAGE.to_string()).into());
        }

        let user = User {
            account_id: unique_id(),
            user_name: user_name.to_string(),
            email: email.to_string(),
            avatar: avatar_url(user_name),
        };
        state.accounts.push(MockAccount {
            email: email.to_string(),
            password: password.expose_secret().to_string(),
            user: user.clone(),
        });
        state.session = Some(Session {
            id: unique_id(),
            user_id: user.account_id.clone(),
            expire: Utc::now() + ChronoDuration::days(365),
        });

        Ok(user)
    }

    async fn authenticate(&self, email: &str, password: &SecretString) -> Result<Session> {
        self.enter("authenticate", Some(email)).await?;

        let mut state = self.lock();
        let account_id = state
            .accounts
            .iter()
            .find(|a| a.email == email && a.password == password.expose_secret())
            .map(|a| a.user.account_id.clone())
            .ok_or_else(|| GatewayError::InvalidCredentials(INVALID_CREDENTIALS_MESSAGE.to_string()))?;

        let session = Session {
            id: unique_id(),
            user_id: account_id,
            expire: Utc::now() + ChronoDuration::days(365),
        };
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn current_user(&self) -> Result<Option<User>> {
        self.enter("current_user", None).await?;

        let state = self.lock();
        let Some(session) = state.session.as_ref() else {
            return Ok(None);
        };

        state
            .accounts
            .iter()
            .find(|a| a.user.account_id == session.user_id)
            .map(|a| Some(a.user.clone()))
            .ok_or_else(|| {
                GatewayError::NotFound(format!("No user profile for account {}", session.user_id))
                    .into()
            })
    }

    async fn list_videos(&self) -> Result<Vec<Video>> {
        self.enter("list_videos", None).await?;
        Ok(self.lock().videos.clone())
    }

    async fn latest_videos(&self, limit: usize) -> Result<Vec<Video>> {
        self.enter("latest_videos", Some(&limit.to_string())).await?;
        Ok(self.newest_first().into_iter().take(limit).collect())
    }

    async fn search_videos(&self, query: &str) -> Result<Vec<Video>> {
        self.enter("search_videos", Some(query)).await?;
        let needle = query.to_lowercase();
        Ok(self
            .newest_first()
            .into_iter()
            .filter(|v| v.title.to_lowercase().contains(&needle))
            .collect())
    }

    async fn videos_by_user(&self, account_id: &str) -> Result<Vec<Video>> {
        self.enter("videos_by_user", Some(account_id)).await?;
        Ok(self
            .newest_first()
            .into_iter()
            .filter(|v| v.user.account_id == account_id)
            .collect())
    }

    fn forget_session(&self) {
        let mut state = self.lock();
        state.calls.push("forget_session".to_string());
        state.session = None;
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AoraError;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn seeded() -> MockGateway {
        let alice = mock_user("acc-alice", "alice");
        let bob = mock_user("acc-bob", "bob");
        MockGateway::with_videos(vec![
            mock_video("1", "Sunset over water", &alice),
            mock_video("2", "City lights", &bob),
            mock_video("3", "Sunset in the desert", &bob),
        ])
    }

    #[tokio::test]
    async fn test_latest_is_newest_first_and_limited() {
        let gateway = seeded();
        let latest = gateway.latest_videos(2).await.unwrap();

        let ids: Vec<_> = latest.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2"]);
    }

    #[tokio::test]
    async fn test_search_matches_title_case_insensitively() {
        let gateway = seeded();
        let found = gateway.search_videos("sunset").await.unwrap();

        let ids: Vec<_> = found.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
        assert_eq!(gateway.calls(), vec!["search_videos:sunset".to_string()]);
    }

    #[tokio::test]
    async fn test_videos_by_user() {
        let gateway = seeded();
        let found = gateway.videos_by_user("acc-bob").await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|v| v.user.user_name == "bob"));
    }

    #[tokio::test]
    async fn test_create_account_then_duplicate() {
        let gateway = MockGateway::new();
        let user = gateway
            .create_account("jsm@example.com", &secret("hunter22"), "jsm")
            .await
            .unwrap();
        assert_eq!(user.user_name, "jsm");
        assert!(gateway.session().is_some());

        let err = gateway
            .create_account("jsm@example.com", &secret("other"), "jsm2")
            .await
            .unwrap_err();
        assert!(matches!(err, AoraError::Gateway(GatewayError::DuplicateAccount(_))));
        assert_eq!(gateway.account_count(), 1);
    }

    #[tokio::test]
    async fn test_authenticate_and_current_user() {
        let gateway = MockGateway::new();
        assert_eq!(gateway.current_user().await.unwrap(), None);

        gateway.add_account("a@example.com", "pw", mock_user("acc-a", "a"));
        let err = gateway.authenticate("a@example.com", &secret("wrong")).await.unwrap_err();
        assert!(matches!(err, AoraError::Gateway(GatewayError::InvalidCredentials(_))));

        let session = gateway.authenticate("a@example.com", &secret("pw")).await.unwrap();
        assert_eq!(session.user_id, "acc-a");
        let user = gateway.current_user().await.unwrap().unwrap();
        assert_eq!(user.account_id, "acc-a");
    }

    #[tokio::test]
    async fn test_queued_failure_applies_once() {
        let gateway = seeded();
        gateway.queue_failure(GatewayError::Network("Network timeout".to_string()));

        assert!(gateway.list_videos().await.is_err());
        assert_eq!(gateway.list_videos().await.unwrap().len(), 3);
        assert_eq!(gateway.call_count("list_videos"), 2);
    }

    #[tokio::test]
    async fn test_queue_failure_on_targets_one_operation() {
        let gateway = seeded();
        gateway.queue_failure_on("latest_videos", GatewayError::Network("down".to_string()));

        assert!(gateway.list_videos().await.is_ok());
        assert!(gateway.latest_videos(2).await.is_err());
        assert!(gateway.latest_videos(2).await.is_ok());
    }

    #[tokio::test]
    async fn test_forget_session() {
        let gateway = MockGateway::new();
        gateway.add_account("a@example.com", "pw", mock_user("acc-a", "a"));
        gateway.authenticate("a@example.com", &secret("pw")).await.unwrap();

        gateway.forget_session();
        assert!(gateway.session().is_none());
        assert_eq!(gateway.current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fail_with_until_cleared() {
        let gateway = seeded();
        gateway.fail_with(GatewayError::Network("down".to_string()));
        assert!(gateway.list_videos().await.is_err());
        assert!(gateway.latest_videos(7).await.is_err());

        gateway.clear_failure();
        assert!(gateway.list_videos().await.is_ok());
    }
}
