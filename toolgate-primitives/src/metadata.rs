//! Log-safe key/value metadata attached to invocations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MAX_KEY_LEN: usize = 64;
const MAX_VALUE_LEN: usize = 512;

/// Lightweight string context carried alongside an invocation.
///
/// Values end up in structured logs verbatim, so callers must never place
/// credentials or other secret material here.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    /// Creates an empty metadata map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, replacing any previous value for the key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMetadata`] if the key is blank or either side
    /// exceeds its length limit.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        if key.trim().is_empty() {
            return Err(Error::InvalidMetadata {
                reason: "key cannot be empty".into(),
            });
        }
        if key.len() > MAX_KEY_LEN {
            return Err(Error::InvalidMetadata {
                reason: format!("key `{key}` exceeds {MAX_KEY_LEN} bytes"),
            });
        }
        if value.len() > MAX_VALUE_LEN {
            return Err(Error::InvalidMetadata {
                reason: format!("value for `{key}` exceeds {MAX_VALUE_LEN} bytes"),
            });
        }
        self.0.insert(key, value);
        Ok(())
    }

    /// Chaining variant of [`Metadata::insert`].
    ///
    /// # Errors
    ///
    /// See [`Metadata::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        self.insert(key, value)?;
        Ok(self)
    }

    /// Returns the value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no entries are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
