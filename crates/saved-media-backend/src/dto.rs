//! Wire shapes returned by the backend.
//!
//! The backend hands out ORM rows more or less as stored, so the same movie
//! can show up in camelCase or snake_case, with numeric or string ids, bare or
//! nested under a join row. Everything is decoded into these types first and
//! converted into model types at the edge.

use chrono::{DateTime, Utc};
use saved_media_models::{AuthTokens, SavedItem, ToggleResponse, UserProfile};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct WireMovie {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "originName")]
    origin_name: Option<String>,
    #[serde(default, alias = "thumbUrl")]
    thumb_url: Option<String>,
    #[serde(default, alias = "posterUrl")]
    poster_url: Option<String>,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default)]
    year: Option<Value>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    lang: Option<String>,
    #[serde(default, alias = "episodeCurrent")]
    episode_current: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// A list entry: either the movie itself or a join row wrapping it
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireEntry {
    Joined { movie: WireMovie },
    Plain(WireMovie),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireList {
    Bare(Vec<WireEntry>),
    Items { items: Vec<WireEntry> },
    Data { data: Vec<WireEntry> },
}

#[derive(Debug, Deserialize)]
pub struct WireToggle {
    added: bool,
}

#[derive(Debug, Deserialize)]
pub struct WireAuth {
    #[serde(alias = "accessToken", alias = "token")]
    access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct WireUser {
    id: Value,
    email: String,
    #[serde(default, alias = "fullName", alias = "username")]
    name: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default, alias = "createdAt")]
    created_at: Option<String>,
}

/// Profile responses come either bare or wrapped as `{ "user": ... }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireProfile {
    Wrapped { user: WireUser },
    Bare(WireUser),
}

fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl WireMovie {
    pub fn into_item(self) -> SavedItem {
        SavedItem {
            id: self.id.as_ref().and_then(value_as_u64),
            slug: self.slug.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            origin_name: self.origin_name,
            thumb_url: self.thumb_url,
            poster_url: self.poster_url,
            quality: self.quality,
            year: self.year.as_ref().and_then(value_as_u64).and_then(|y| u32::try_from(y).ok()),
            time: self.time,
            lang: self.lang,
            episode_current: self.episode_current,
            extra: self.rest,
        }
    }
}

impl WireEntry {
    pub fn into_item(self) -> SavedItem {
        match self {
            WireEntry::Joined { movie } => movie.into_item(),
            WireEntry::Plain(movie) => movie.into_item(),
        }
    }
}

impl WireList {
    pub fn into_items(self) -> Vec<SavedItem> {
        let entries = match self {
            WireList::Bare(entries) => entries,
            WireList::Items { items } => items,
            WireList::Data { data } => data,
        };
        entries.into_iter().map(WireEntry::into_item).collect()
    }
}

impl From<WireToggle> for ToggleResponse {
    fn from(wire: WireToggle) -> Self {
        ToggleResponse { added: wire.added }
    }
}

impl From<WireAuth> for AuthTokens {
    fn from(wire: WireAuth) -> Self {
        AuthTokens {
            access_token: wire.access_token,
        }
    }
}

impl WireProfile {
    pub fn into_profile(self) -> Option<UserProfile> {
        let user = match self {
            WireProfile::Wrapped { user } => user,
            WireProfile::Bare(user) => user,
        };
        let id = value_as_u64(&user.id)?;
        let created_at = user
            .created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        Some(UserProfile {
            id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at,
        })
    }
}
