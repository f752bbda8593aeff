//! Account service: sign-up, sign-in and session restore
//!
//! Every operation validates its form first, talks to the gateway, and only
//! then touches the [`SessionContext`]. A failed operation leaves the session
//! exactly as it was.

use std::sync::Arc;

use crate::error::{GatewayError, Result};
use crate::gateway::Gateway;
use crate::service::events::{Event, EventBus};
use crate::service::validation::{validate_sign_in, validate_sign_up, SignInForm, SignUpForm};
use crate::session::{SessionContext, SessionState};
use crate::types::User;

/// Account service
#[derive(Clone)]
pub struct AccountService {
    gateway: Arc<dyn Gateway>,
    session: Arc<SessionContext>,
    event_bus: EventBus,
}

impl AccountService {
    /// Create a new account service
    pub fn new(gateway: Arc<dyn Gateway>, session: Arc<SessionContext>, event_bus: EventBus) -> Self {
        Self {
            gateway,
            session,
            event_bus,
        }
    }

    /// Register a new account, open a session for it and record the user
    ///
    /// # Errors
    ///
    /// - `GatewayError::Validation` if a field is blank (no gateway call is made)
    /// - `GatewayError::DuplicateAccount` if the email is already registered
    /// - any other gateway failure
    pub async fn sign_up(&self, form: SignUpForm) -> Result<User> {
        validate_sign_up(&form)?;

        let user = self
            .gateway
            .create_account(form.email.trim(), &form.password, form.user_name.trim())
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Sign-up failed"))?;

        tracing::info!(account_id = %user.account_id, "Account created");
        self.signed_in(user.clone());
        Ok(user)
    }

    /// Open a session for an existing account and record its user
    ///
    /// # Errors
    ///
    /// - `GatewayError::Validation` if a field is blank (no gateway call is made)
    /// - `GatewayError::InvalidCredentials` if the backend rejects the pair
    /// - `GatewayError::NotFound` if the account has no user profile
    ///
    /// When the session opens but the profile lookup fails, the gateway's
    /// session is dropped again so it matches the signed-out context.
    pub async fn sign_in(&self, form: SignInForm) -> Result<User> {
        validate_sign_in(&form)?;

        let session = self
            .gateway
            .authenticate(form.email.trim(), &form.password)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Sign-in failed"))?;
        tracing::debug!(user_id = %session.user_id, "Session opened");

        let user = match self.gateway.current_user().await {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.gateway.forget_session();
                return Err(GatewayError::NotFound(format!(
                    "No user profile for account {}",
                    session.user_id
                ))
                .into());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile lookup failed, dropping session");
                self.gateway.forget_session();
                return Err(e);
            }
        };

        self.signed_in(user.clone());
        Ok(user)
    }

    /// Ask the backend for an existing session
    ///
    /// Never fails: a failed check leaves the context signed out.
    pub async fn restore(&self) -> SessionState {
        let state = self.session.initialize(self.gateway.as_ref()).await;
        self.event_bus.emit(Event::SessionChanged {
            logged_in: state.is_logged_in,
            account_id: state.user.as_ref().map(|u| u.account_id.clone()),
        });
        state
    }

    /// The signed-in user, if any
    pub fn current(&self) -> Option<User> {
        self.session.user()
    }

    fn signed_in(&self, user: User) {
        let account_id = user.account_id.clone();
        self.session.update(user);
        self.event_bus.emit(Event::SessionChanged {
            logged_in: true,
            account_id: Some(account_id),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::{mock_user, MockGateway};
    use crate::AoraError;
    use secrecy::SecretString;

    fn service(gateway: &MockGateway) -> (AccountService, Arc<SessionContext>) {
        let session = Arc::new(SessionContext::new());
        let service = AccountService::new(
            Arc::new(gateway.clone()),
            Arc::clone(&session),
            EventBus::new(10),
        );
        (service, session)
    }

    fn sign_up_form(email: &str, user_name: &str) -> SignUpForm {
        SignUpForm {
            user_name: user_name.to_string(),
            email: email.to_string(),
            password: SecretString::from("hunter22".to_string()),
        }
    }

    #[tokio::test]
    async fn test_sign_up_records_session() {
        let gateway = MockGateway::new();
        let (service, session) = service(&gateway);

        let user = service.sign_up(sign_up_form("jsm@example.com", "jsm")).await.unwrap();

        let state = session.read();
        assert!(state.is_logged_in);
        assert_eq!(state.user, Some(user));
    }

    #[tokio::test]
    async fn test_sign_up_blank_field_skips_gateway() {
        let gateway = MockGateway::new();
        let (service, session) = service(&gateway);

        let err = service.sign_up(sign_up_form("", "jsm")).await.unwrap_err();

        assert_eq!(err.exit_code(), 3);
        assert!(gateway.calls().is_empty());
        assert!(!session.read().is_logged_in);
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password_leaves_session() {
        let gateway = MockGateway::new();
        gateway.add_account("a@example.com", "pw", mock_user("acc-a", "a"));
        let (service, session) = service(&gateway);

        let err = service
            .sign_in(SignInForm {
                email: "a@example.com".to_string(),
                password: SecretString::from("nope".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AoraError::Gateway(GatewayError::InvalidCredentials(_))));
        assert!(session.read().user.is_none());
    }

    #[tokio::test]
    async fn test_sign_in_emits_session_changed() {
        let gateway = MockGateway::new();
        gateway.add_account("a@example.com", "pw", mock_user("acc-a", "a"));
        let session = Arc::new(SessionContext::new());
        let events = EventBus::new(10);
        let mut rx = events.subscribe();
        let service = AccountService::new(Arc::new(gateway.clone()), session, events);

        service
            .sign_in(SignInForm {
                email: " a@example.com ".to_string(),
                password: SecretString::from("pw".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            Event::SessionChanged {
                logged_in: true,
                account_id: Some("acc-a".to_string()),
            }
        );
        assert_eq!(service.current().unwrap().account_id, "acc-a");
    }

    #[tokio::test]
    async fn test_sign_in_profile_failure_drops_gateway_session() {
        let gateway = MockGateway::new();
        gateway.add_account("a@example.com", "pw", mock_user("acc-a", "a"));
        gateway.queue_failure_on("current_user", GatewayError::Network("offline".to_string()));
        let (service, session) = service(&gateway);

        let err = service
            .sign_in(SignInForm {
                email: "a@example.com".to_string(),
                password: SecretString::from("pw".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AoraError::Gateway(GatewayError::Network(_))));
        assert!(gateway.session().is_none());
        assert_eq!(gateway.call_count("forget_session"), 1);
        assert!(!session.read().is_logged_in);
    }

    #[tokio::test]
    async fn test_restore_without_session() {
        let gateway = MockGateway::new();
        let (service, _) = service(&gateway);

        let state = service.restore().await;
        assert!(!state.is_loading);
        assert!(!state.is_logged_in);
    }
}
