//! Caller principal attached to invocations.
//!
//! The principal is informational: it is carried through the executor and
//! logged, but no authorization decision is derived from it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MAX_ID_LEN: usize = 128;
const MAX_ROLE_LEN: usize = 64;

/// Broad category of the principal issuing a call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerKind {
    /// A human end user.
    User,
    /// A backend service.
    Service,
    /// An autonomous agent.
    Agent,
    /// The transport did not say.
    #[default]
    Unknown,
}

/// Identity of the invoker of a tool.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Caller {
    id: String,
    kind: CallerKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tenant_id: Option<String>,
}

impl Caller {
    /// Starts building a caller principal with the supplied stable id.
    #[must_use]
    pub fn builder(id: impl Into<String>) -> CallerBuilder {
        CallerBuilder {
            id: id.into(),
            kind: CallerKind::default(),
            roles: BTreeSet::new(),
            tenant_id: None,
        }
    }

    /// Stable principal identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Principal category.
    #[must_use]
    pub const fn kind(&self) -> CallerKind {
        self.kind
    }

    /// Roles held by the principal, sorted and de-duplicated.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Optional tenant the principal belongs to.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Returns `true` when the principal holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Builder for [`Caller`].
#[derive(Debug)]
pub struct CallerBuilder {
    id: String,
    kind: CallerKind,
    roles: BTreeSet<String>,
    tenant_id: Option<String>,
}

impl CallerBuilder {
    /// Sets the principal category.
    #[must_use]
    pub fn kind(mut self, kind: CallerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Adds a role.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCaller`] if the role is blank or too long.
    pub fn add_role(mut self, role: impl Into<String>) -> Result<Self> {
        let role = role.into();
        if role.trim().is_empty() {
            return Err(Error::InvalidCaller {
                reason: "role cannot be empty".into(),
            });
        }
        if role.len() > MAX_ROLE_LEN {
            return Err(Error::InvalidCaller {
                reason: format!("role length must be <= {MAX_ROLE_LEN}"),
            });
        }
        self.roles.insert(role);
        Ok(self)
    }

    /// Sets the tenant identifier.
    #[must_use]
    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Finalises the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCaller`] if the id is blank or too long.
    pub fn build(self) -> Result<Caller> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidCaller {
                reason: "caller id cannot be empty".into(),
            });
        }
        if self.id.len() > MAX_ID_LEN {
            return Err(Error::InvalidCaller {
                reason: format!("caller id length must be <= {MAX_ID_LEN}"),
            });
        }

        Ok(Caller {
            id: self.id,
            kind: self.kind,
            roles: self.roles.into_iter().collect(),
            tenant_id: self.tenant_id,
        })
    }
}
