//! # Session Context
//!
//! Every write operation takes a [`Session`] explicitly. There is no ambient
//! "current user": the caller that authenticated the user builds the session
//! and hands it down.
//!
//! ```text
//! Login screen ──► Session::authenticated("uid-123")
//!                         │
//!                         ▼
//!     db.sales_fulfillment().ship(&session, order_id)
//!                         │
//!                         ▼
//!     session.require_actor()?   ← fails with Unauthorized before any read
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Identifier of the user performing an operation. Recorded on history
/// entries and order audit fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        ActorId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller context for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    actor: Option<ActorId>,
}

impl Session {
    /// A session for a signed-in user. Blank ids count as anonymous.
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Session::anonymous();
        }
        Session {
            actor: Some(ActorId(user_id)),
        }
    }

    pub fn anonymous() -> Self {
        Session { actor: None }
    }

    pub fn actor(&self) -> Option<&ActorId> {
        self.actor.as_ref()
    }

    /// Returns the actor or `Unauthorized`.
    pub fn require_actor(&self) -> CoreResult<&ActorId> {
        self.actor.as_ref().ok_or(CoreError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_actor() {
        let session = Session::authenticated("uid-123");
        assert_eq!(session.require_actor().unwrap().as_str(), "uid-123");

        let anon = Session::anonymous();
        assert!(matches!(anon.require_actor(), Err(CoreError::Unauthorized)));
    }

    #[test]
    fn test_blank_user_is_anonymous() {
        assert!(Session::authenticated("   ").actor().is_none());
    }
}
