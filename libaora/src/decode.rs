//! Decoding of backend documents into typed entities
//!
//! Backend documents are loose JSON objects. Each entity has a fixed field
//! map from backend attribute name to struct field; every mapped attribute is
//! required, and decoding stops at the first missing or mistyped one.
//!
//! # Examples
//!
//! ```
//! use libaora::decode::decode_user;
//! use serde_json::json;
//!
//! let doc = json!({
//!     "accountId": "acc1",
//!     "username": "jsm",
//!     "email": "jsm@example.com",
//!     "avatar": "https://cloud.appwrite.io/v1/avatars/initials?project=p",
//! });
//!
//! let user = decode_user(&doc).unwrap();
//! assert_eq!(user.user_name, "jsm");
//! ```

use serde_json::{Map, Value};
use url::Url;

use crate::error::DecodeError;
use crate::types::{User, Video};

/// Backend attribute names of a user profile document
#[derive(Debug, Clone, Copy)]
pub struct UserFieldMap {
    pub account_id: &'static str,
    pub user_name: &'static str,
    pub email: &'static str,
    pub avatar: &'static str,
}

/// Backend attribute names of a video document
#[derive(Debug, Clone, Copy)]
pub struct VideoFieldMap {
    pub id: &'static str,
    pub title: &'static str,
    pub thumbnail: &'static str,
    pub prompt: &'static str,
    pub video: &'static str,
    /// Relationship attribute holding the creator's profile document
    pub user: &'static str,
}

pub const USER_FIELDS: UserFieldMap = UserFieldMap {
    account_id: "accountId",
    user_name: "username",
    email: "email",
    avatar: "avatar",
};

pub const VIDEO_FIELDS: VideoFieldMap = VideoFieldMap {
    id: "$id",
    title: "title",
    thumbnail: "thumbnail",
    prompt: "prompt",
    video: "video",
    user: "users",
};

const USER: &str = "user";
const VIDEO: &str = "video";

/// Decode a user profile document
pub fn decode_user(doc: &Value) -> Result<User, DecodeError> {
    let obj = as_object(doc, USER)?;

    Ok(User {
        account_id: required_str(obj, USER, USER_FIELDS.account_id)?,
        user_name: required_str(obj, USER, USER_FIELDS.user_name)?,
        email: required_str(obj, USER, USER_FIELDS.email)?,
        avatar: required_url(obj, USER, USER_FIELDS.avatar)?,
    })
}

/// Decode a video document, including its nested creator profile
pub fn decode_video(doc: &Value) -> Result<Video, DecodeError> {
    let obj = as_object(doc, VIDEO)?;

    let user_doc = obj
        .get(VIDEO_FIELDS.user)
        .filter(|v| !v.is_null())
        .ok_or(DecodeError::MissingField {
            entity: VIDEO,
            field: VIDEO_FIELDS.user,
        })?;
    if !user_doc.is_object() {
        return Err(DecodeError::InvalidType {
            entity: VIDEO,
            field: VIDEO_FIELDS.user,
            expected: "object",
        });
    }

    Ok(Video {
        id: required_str(obj, VIDEO, VIDEO_FIELDS.id)?,
        title: required_str(obj, VIDEO, VIDEO_FIELDS.title)?,
        thumbnail: required_url(obj, VIDEO, VIDEO_FIELDS.thumbnail)?,
        prompt: required_str(obj, VIDEO, VIDEO_FIELDS.prompt)?,
        video: required_url(obj, VIDEO, VIDEO_FIELDS.video)?,
        user: decode_user(user_doc)?,
    })
}

/// Decode every document of a list, failing on the first bad one
pub fn decode_videos(docs: &[Value]) -> Result<Vec<Video>, DecodeError> {
    docs.iter().map(decode_video).collect()
}

fn as_object<'a>(doc: &'a Value, entity: &'static str) -> Result<&'a Map<String, Value>, DecodeError> {
    doc.as_object().ok_or(DecodeError::NotAnObject { entity })
}

fn required_str(
    obj: &Map<String, Value>,
    entity: &'static str,
    field: &'static str,
) -> Result<String, DecodeError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(DecodeError::MissingField { entity, field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(DecodeError::InvalidType {
            entity,
            field,
            expected: "string",
        }),
    }
}

fn required_url(
    obj: &Map<String, Value>,
    entity: &'static str,
    field: &'static str,
) -> Result<Url, DecodeError> {
    let raw = required_str(obj, entity, field)?;
    Url::parse(&raw).map_err(|_| DecodeError::InvalidUrl {
        entity,
        field,
        value: raw,
    })
}
