//! Book model and list page types

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A catalog book as returned by the backend.
///
/// `availability` only changes through the rent and return endpoints; no
/// request body this crate sends carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(with = "calendar_date")]
    pub published_date: NaiveDate,
    #[serde(deserialize_with = "flexible_bool")]
    pub availability: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Create book request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(with = "calendar_date")]
    pub published_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Single-book responses come either wrapped in `data` or bare
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BookEnvelope {
    Wrapped { data: Book },
    Bare(Book),
}

impl BookEnvelope {
    pub fn into_book(self) -> Book {
        match self {
            BookEnvelope::Wrapped { data } => data,
            BookEnvelope::Bare(book) => book,
        }
    }
}

/// Raw `GET /books` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub data: Vec<Book>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMeta {
    pub current_page: Option<u32>,
    pub last_page: Option<u32>,
    pub total: Option<u64>,
}

/// One page of the filtered book list
#[derive(Debug, Clone, PartialEq)]
pub struct BookPage {
    pub items: Vec<Book>,
    pub current_page: u32,
    pub last_page: u32,
    pub total: u64,
}

impl From<ListResponse> for BookPage {
    fn from(response: ListResponse) -> Self {
        let meta = response.meta.unwrap_or_default();
        let last_page = meta.last_page.unwrap_or(1).max(1);
        let current_page = meta.current_page.unwrap_or(1).clamp(1, last_page);

        Self {
            items: response.data,
            current_page,
            last_page,
            total: meta.total.unwrap_or(0),
        }
    }
}

impl BookPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Book> {
        self.items.iter().find(|book| book.id == id)
    }
}

/// `YYYY-MM-DD`, also accepting a full timestamp and keeping its date part
mod calendar_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let date_part = raw.get(..10).unwrap_or(&raw);
        NaiveDate::parse_from_str(date_part, FORMAT).map_err(de::Error::custom)
    }
}

/// Backends serialize booleans as `true`, `1` or `"1"` depending on the driver
fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Number(n) => Ok(n.as_f64().map_or(false, |v| v != 0.0)),
        serde_json::Value::String(s) => match s.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(D::Error::custom(format!("invalid availability: {}", other))),
        },
        other => Err(D::Error::custom(format!("invalid availability: {}", other))),
    }
}
