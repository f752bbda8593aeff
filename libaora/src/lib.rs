//! Aora - video sharing client core
//!
//! This library provides the pieces every Aora front end is built from:
//! a typed gateway to the backend-as-a-service, document decoding, the
//! fetch-state controller that drives list screens, and the process-wide
//! session context.

pub mod config;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod gateway;
pub mod logging;
pub mod service;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AoraError, DecodeError, GatewayError, Result};
pub use fetch::{FetchController, FetchError, FetchState};
pub use gateway::Gateway;
pub use session::{SessionContext, SessionState};
pub use types::{Session, User, Video};
