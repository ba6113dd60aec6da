//! Upstream records and the views derived from them.
//!
//! Everything here lives for a single inbound request.

use serde::de::{DeserializeOwned, IgnoredAny, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// Value side of the upstream user mapping: either the bare name or a record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UserEntry {
    Name(String),
    Record { name: String },
}

impl From<UserEntry> for String {
    fn from(entry: UserEntry) -> Self {
        match entry {
            UserEntry::Name(name) | UserEntry::Record { name } => name,
        }
    }
}

/// A post as the upstream returned it. Only `id` is interpreted; every other
/// field, `userId` included, is carried through to the response unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Comments are only ever counted, so their bodies are skipped while decoding.
pub type Comment = IgnoredAny;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPostCount {
    pub user_id: String,
    pub name: String,
    pub post_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostWithCommentCount {
    #[serde(flatten)]
    pub post: Post,
    pub comment_count: usize,
}

impl PostWithCommentCount {
    pub fn new(mut post: Post, comment_count: usize) -> Self {
        // Our count replaces any upstream field of the same name
        post.fields.shift_remove("comment_count");
        Self {
            post,
            comment_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostType {
    Popular,
    Latest,
}

impl FromStr for PostType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popular" => Ok(PostType::Popular),
            "latest" => Ok(PostType::Latest),
            _ => Err(AppError::InvalidPostType),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    #[serde(rename = "type")]
    pub post_type: Option<String>,
}

impl PostsQuery {
    pub fn parse_type(&self) -> Result<PostType, AppError> {
        self.post_type
            .as_deref()
            .ok_or(AppError::InvalidPostType)?
            .parse()
    }
}

#[derive(Debug, Serialize)]
pub struct TopUsersResponse {
    pub top_users: Vec<UserPostCount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostsResponse {
    LatestPosts(Vec<Post>),
    PopularPosts(Vec<PostWithCommentCount>),
}

// ============================================
// Upstream payload decoding
// ============================================

/// Decode the user mapping, keeping the upstream's key order.
///
/// Accepts the bare mapping or one wrapped as `{"users": {...}}`. A lone
/// `users` entry holding a `{"name": ...}` record is a user, not a wrapper.
pub fn decode_users(payload: Value) -> Result<Vec<User>, serde_json::Error> {
    let payload = if is_lone_user_record(&payload) {
        payload
    } else {
        unwrap_envelope(payload, "users")
    };

    let map: Map<String, Value> = match payload {
        Value::Object(map) => map,
        other => {
            return Err(serde::de::Error::invalid_type(
                unexpected(&other),
                &"an object",
            ))
        }
    };

    map.into_iter()
        .map(|(id, entry)| {
            let name = String::from(serde_json::from_value::<UserEntry>(entry)?);
            Ok::<_, serde_json::Error>(User { id, name })
        })
        .collect()
}

/// Decode a list payload, bare or wrapped under `envelope`.
pub fn decode_list<T>(payload: Value, envelope: &str) -> Result<Vec<T>, serde_json::Error>
where
    T: DeserializeOwned,
{
    serde_json::from_value(unwrap_envelope(payload, envelope))
}

fn unwrap_envelope(payload: Value, key: &str) -> Value {
    match payload {
        Value::Object(mut map) if map.len() == 1 && map.get(key).is_some_and(is_container) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

fn is_lone_user_record(payload: &Value) -> bool {
    payload
        .as_object()
        .filter(|map| map.len() == 1)
        .and_then(|map| map.get("users"))
        .and_then(|inner| inner.get("name"))
        .is_some_and(Value::is_string)
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}
