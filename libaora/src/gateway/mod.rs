//! Gateway abstraction and implementations
//!
//! The gateway is the only place that talks to the backend-as-a-service.
//! It owns account, session and document-collection calls, decodes the
//! returned documents into typed entities, and normalizes every backend
//! failure into a [`GatewayError`](crate::error::GatewayError) before it
//! reaches a caller.
//!
//! # Examples
//!
//! ```no_run
//! use libaora::gateway::{Gateway, appwrite::AppwriteGateway};
//! use libaora::Config;
//!
//! # async fn example() -> libaora::Result<()> {
//! let config = Config::load()?;
//! let gateway = AppwriteGateway::new(&config.gateway)?;
//!
//! for video in gateway.latest_videos(config.feed.latest_limit).await? {
//!     println!("{} by @{}", video.title, video.user.user_name);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::Result;
use crate::types::{Session, User, Video};

pub mod appwrite;
pub mod query;

// Mock gateway is available for all builds (not just tests) to support integration tests
pub mod mock;

pub use query::Query;

/// Backend operations consumed by services and fetch controllers
///
/// Implementations must be usable behind `Arc<dyn Gateway>` from any task.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Register a new account, sign it in, and create its profile document
    ///
    /// Callers validate that no field is empty before invoking this.
    ///
    /// # Errors
    ///
    /// - `GatewayError::DuplicateAccount` if the email is already registered;
    ///   no session is created in that case
    /// - `GatewayError::Network` on transport or backend failure
    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
        user_name: &str,
    ) -> Result<User>;

    /// Open an email/password session
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidCredentials` when the backend rejects
    /// the pair.
    async fn authenticate(&self, email: &str, password: &SecretString) -> Result<Session>;

    /// Profile of the signed-in account, or `None` without an active session
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` when the account exists but has no
    /// profile document.
    async fn current_user(&self) -> Result<Option<User>>;

    /// Every video in the collection, in backend order
    async fn list_videos(&self) -> Result<Vec<Video>>;

    /// Newest videos first, at most `limit`
    async fn latest_videos(&self, limit: usize) -> Result<Vec<Video>>;

    /// Videos whose title matches `query`, newest first
    ///
    /// Never called with an empty query; callers reject that beforehand.
    async fn search_videos(&self, query: &str) -> Result<Vec<Video>>;

    /// Videos created by the account `account_id`, newest first
    async fn videos_by_user(&self, account_id: &str) -> Result<Vec<Video>>;

    /// Drop the session this gateway holds, without contacting the backend
    ///
    /// Used when a sign-in opened a session but could not be completed, so
    /// the gateway never stays signed in behind a signed-out context.
    fn forget_session(&self);

    /// Short identifier used in logs (e.g. "appwrite", "mock")
    fn name(&self) -> &str;
}

/// Generate a backend document/account identifier
///
/// 32 lowercase hex characters, which satisfies the backend's custom id
/// rules (max 36 chars, alphanumeric start).
pub fn unique_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
