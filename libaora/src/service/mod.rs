//! Service layer for Aora
//!
//! Front ends talk to this layer instead of the gateway directly, so the CLI
//! binaries and any future interface share one set of rules.
//!
//! # Architecture
//!
//! `AoraService` is the facade. It owns the shared resources (config,
//! gateway, session context, event bus) and hands out the sub-services:
//!
//! - `AccountService`: sign-up, sign-in, session restore
//! - `VideoService`: fetch controllers for the list screens
//! - `EventBus`: fetch progress and alert distribution
//!
//! # Example
//!
//! ```no_run
//! use libaora::service::AoraService;
//!
//! # async fn example() -> libaora::Result<()> {
//! let service = AoraService::new()?;
//! service.account().restore().await;
//!
//! let feed = service.videos().feed();
//! let state = feed.refetch().await;
//! println!("{} videos", state.data.len());
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod events;
pub mod validation;
pub mod videos;

use std::sync::Arc;

use self::account::AccountService;
use self::events::EventBus;
use self::videos::VideoService;
use crate::gateway::appwrite::AppwriteGateway;
use crate::gateway::Gateway;
use crate::session::SessionContext;
use crate::{Config, Result};

/// Main service facade that coordinates all sub-services
///
/// All sub-services share the same gateway, config and session context.
pub struct AoraService {
    config: Arc<Config>,
    gateway: Arc<dyn Gateway>,
    session: Arc<SessionContext>,
    account: AccountService,
    videos: VideoService,
    event_bus: EventBus,
}

impl AoraService {
    /// Create a service from the configuration at the default location
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the HTTP
    /// client cannot be built.
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config)
    }

    /// Create a service talking to the backend described by `config`
    pub fn from_config(config: Config) -> Result<Self> {
        let gateway = AppwriteGateway::new(&config.gateway)?;
        Ok(Self::with_gateway(config, Arc::new(gateway)))
    }

    /// Create a service over any gateway (tests pass a `MockGateway`)
    pub fn with_gateway(config: Config, gateway: Arc<dyn Gateway>) -> Self {
        let config = Arc::new(config);
        let session = Arc::new(SessionContext::new());
        let event_bus = EventBus::new(100);

        tracing::debug!(gateway = gateway.name(), "Service created");

        let account = AccountService::new(
            Arc::clone(&gateway),
            Arc::clone(&session),
            event_bus.clone(),
        );
        let videos = VideoService::new(
            Arc::clone(&gateway),
            Arc::clone(&config),
            Arc::clone(&session),
            event_bus.clone(),
        );

        Self {
            config,
            gateway,
            session,
            account,
            videos,
            event_bus,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Access the gateway directly
    pub fn gateway(&self) -> &dyn Gateway {
        self.gateway.as_ref()
    }

    /// Access the account service
    pub fn account(&self) -> &AccountService {
        &self.account
    }

    /// Access the video service
    pub fn videos(&self) -> &VideoService {
        &self.videos
    }

    /// The process-wide session context
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Subscribe to service events
    ///
    /// Returns a receiver for fetch progress, alerts and session changes.
    /// Multiple subscribers are supported.
    pub fn subscribe(&self) -> events::EventReceiver {
        self.event_bus.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockGateway;

    #[test]
    fn test_facade_shares_session() {
        let service =
            AoraService::with_gateway(Config::default_config(), Arc::new(MockGateway::new()));

        service.session().update(crate::gateway::mock::mock_user("acc-1", "one"));
        assert_eq!(service.account().current().unwrap().account_id, "acc-1");
        assert_eq!(service.gateway().name(), "mock");
    }

    #[test]
    fn test_from_config_builds_http_gateway() {
        let service = AoraService::from_config(Config::default_config()).unwrap();
        assert_eq!(service.gateway().name(), "appwrite");
        assert_eq!(service.config().feed.latest_limit, 7);
    }
}
