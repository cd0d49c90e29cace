use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A movie or series the user has saved.
///
/// Serialized in camelCase, the same shape the stored collections use.
/// Display fields this crate does not know about are kept in `extra` so a
/// read/write cycle never drops them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    /// Numeric movie id assigned by the backend, when known
    #[serde(default, deserialize_with = "deserialize_lenient_id")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    pub slug: String,
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_optional_text")]
    pub origin_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_optional_text")]
    pub thumb_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_optional_text")]
    pub poster_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_optional_text")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_lenient_year")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_optional_text")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_optional_text")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_optional_text")]
    pub episode_current: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identity of an item inside a collection.
///
/// Only `Id` keys can be reconciled with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Id(u64),
    Slug(String),
}

impl SavedItem {
    pub fn new(id: u64, slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            slug: slug.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn key(&self) -> ItemKey {
        match self.id {
            Some(id) => ItemKey::Id(id),
            None => ItemKey::Slug(self.slug.clone()),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Id(id) => write!(f, "id:{}", id),
            ItemKey::Slug(slug) => write!(f, "slug:{}", slug),
        }
    }
}

/// Older stored collections wrote ids as strings; accept both and treat
/// anything non-numeric as "no id".
fn deserialize_lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Display text written by older clients can be null or a number.
fn value_as_text(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

fn deserialize_lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_as_text(Option::<Value>::deserialize(deserializer)?).unwrap_or_default())
}

fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_as_text(Option::<Value>::deserialize(deserializer)?))
}

fn deserialize_lenient_year<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|y| u32::try_from(y).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
