//! Video service: one fetch controller per list screen
//!
//! Each method binds a fresh [`FetchController`] to a gateway query. The
//! controller is idle until the caller starts it.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::fetch::FetchController;
use crate::gateway::Gateway;
use crate::service::events::EventBus;
use crate::service::validation::validate_search_query;
use crate::session::SessionContext;
use crate::types::Video;

/// Video service
#[derive(Clone)]
pub struct VideoService {
    gateway: Arc<dyn Gateway>,
    config: Arc<Config>,
    session: Arc<SessionContext>,
    event_bus: EventBus,
}

impl VideoService {
    /// Create a new video service
    pub fn new(
        gateway: Arc<dyn Gateway>,
        config: Arc<Config>,
        session: Arc<SessionContext>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            gateway,
            config,
            session,
            event_bus,
        }
    }

    /// Every video, in backend order (home feed)
    pub fn feed(&self) -> FetchController<Video> {
        let gateway = Arc::clone(&self.gateway);
        FetchController::with_events("home", self.event_bus.clone(), move || {
            let gateway = Arc::clone(&gateway);
            async move { gateway.list_videos().await }
        })
    }

    /// Newest videos, capped at `feed.latest_limit`
    pub fn latest(&self) -> FetchController<Video> {
        let gateway = Arc::clone(&self.gateway);
        let limit = self.config.feed.latest_limit;
        FetchController::with_events("latest", self.event_bus.clone(), move || {
            let gateway = Arc::clone(&gateway);
            async move { gateway.latest_videos(limit).await }
        })
    }

    /// Videos whose title matches `query`
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Validation` for a blank query; no controller is
    /// created and the gateway is never called.
    pub fn search(&self, query: &str) -> Result<FetchController<Video>> {
        let query = validate_search_query(query)?;
        let gateway = Arc::clone(&self.gateway);
        Ok(FetchController::with_events(
            format!("search:{}", query),
            self.event_bus.clone(),
            move || {
                let gateway = Arc::clone(&gateway);
                let query = query.clone();
                async move { gateway.search_videos(&query).await }
            },
        ))
    }

    /// Videos created by the signed-in user
    ///
    /// The user is read from the session on every fetch. Without one the
    /// fetch fails and the error lands in the controller state.
    pub fn profile(&self) -> FetchController<Video> {
        let gateway = Arc::clone(&self.gateway);
        let session = Arc::clone(&self.session);
        FetchController::with_events("profile", self.event_bus.clone(), move || {
            let gateway = Arc::clone(&gateway);
            let user = session.user();
            async move {
                match user {
                    Some(user) => gateway.videos_by_user(&user.account_id).await,
                    None => Err(GatewayError::NotFound("Not signed in".to_string()).into()),
                }
            }
        })
    }
}
