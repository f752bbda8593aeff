//! Core domain types for Aora

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// A registered user profile
///
/// Identity key is `account_id`. Users are only ever produced by decoding a
/// gateway response and are never mutated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub account_id: String,
    pub user_name: String,
    pub email: String,
    pub avatar: Url,
}

/// A published video together with its creator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Unique key within a displayed list
    pub id: String,
    pub title: String,
    pub thumbnail: Url,
    pub prompt: String,
    pub video: Url,
    pub user: User,
}

/// An authenticated email/password session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Account the session belongs to
    pub user_id: String,
    pub expire: DateTime<Utc>,
}
