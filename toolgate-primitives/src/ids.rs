//! Invocation identifier types.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const GENERATED_PREFIX: &str = "inv-";

/// Identifier for a single tool invocation.
///
/// Identifiers are either assigned by the caller or generated from a random
/// UUID. They are only required to be unique per call.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(String);

impl InvocationId {
    /// Generates a fresh identifier of the form `inv-<uuid>`.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{GENERATED_PREFIX}{}", Uuid::new_v4().simple()))
    }

    /// Wraps a caller-assigned identifier. An empty value is replaced by a
    /// generated one so that every invocation stays addressable in logs.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.trim().is_empty() {
            Self::generate()
        } else {
            Self(id)
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::generate()
    }
}

impl Display for InvocationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InvocationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for InvocationId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<InvocationId> for String {
    fn from(value: InvocationId) -> Self {
        value.0
    }
}
