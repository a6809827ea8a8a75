//! Opaque keyset-pagination cursors.
//!
//! A cursor is JSON (the last-seen key plus an optional snapshot of the
//! filter it was produced under) wrapped in unpadded base64url. Callers can
//! only hand it back; anything that does not decode, or was produced under
//! a different filter, is a bad page token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("bad page token")]
    BadPageToken,

    #[error("page cursor could not be encoded: {0}")]
    Encode(String),
}

pub fn encode<T: Serialize>(value: &T) -> Result<String, PaginationError> {
    let json = serde_json::to_vec(value).map_err(|e| PaginationError::Encode(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

pub fn decode<T: DeserializeOwned>(token: &str) -> Result<T, PaginationError> {
    let json = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| PaginationError::BadPageToken)?;
    serde_json::from_slice(&json).map_err(|_| PaginationError::BadPageToken)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor<K, F = ()> {
    pub last_seen: K,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<F>,
}

impl<K, F> PageCursor<K, F>
where
    K: Serialize + DeserializeOwned,
    F: Serialize + DeserializeOwned + PartialEq,
{
    pub fn new(last_seen: K, filter: Option<F>) -> Self {
        Self { last_seen, filter }
    }

    pub fn encode(&self) -> Result<String, PaginationError> {
        encode(self)
    }

    /// Position to resume after, or `None` for the first page.
    ///
    /// `page_token` is the caller's raw value; an empty string means "start
    /// from the beginning".
    pub fn decode_for_filter(
        page_token: &str,
        current_filter: Option<&F>,
    ) -> Result<Option<K>, PaginationError> {
        if page_token.is_empty() {
            return Ok(None);
        }
        let cursor: PageCursor<K, F> = decode(page_token)?;
        if cursor.filter.as_ref() != current_filter {
            return Err(PaginationError::BadPageToken);
        }
        Ok(Some(cursor.last_seen))
    }
}

/// One page of results plus the token for the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Empty when there are no more results.
    pub next_page_token: String,
}

impl<T> Page<T> {
    /// Build a page from a query that fetched `limit + 1` rows. The extra
    /// row only signals that another page exists and is dropped.
    pub fn from_overfetch<K, F>(
        mut items: Vec<T>,
        limit: usize,
        key: impl Fn(&T) -> K,
        filter: Option<F>,
    ) -> Result<Self, PaginationError>
    where
        K: Serialize + DeserializeOwned,
        F: Serialize + DeserializeOwned + PartialEq,
    {
        if items.len() <= limit {
            return Ok(Self {
                items,
                next_page_token: String::new(),
            });
        }

        items.truncate(limit);
        let next_page_token = match items.last() {
            Some(last) => PageCursor::new(key(last), filter).encode()?,
            None => String::new(),
        };
        Ok(Self {
            items,
            next_page_token,
        })
    }
}
