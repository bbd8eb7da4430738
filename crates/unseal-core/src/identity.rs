// Authenticated user identity at the interface boundary. Session issuance
// and role assignment live in the host application.

use serde::{Deserialize, Serialize};

/// Role tier attached to an authenticated identity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserTier {
    Member,
    Moderator,
    Admin,
}

impl UserTier {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserTier::Admin)
    }
}

/// Authenticated user reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub tier: UserTier,
}

impl UserRef {
    pub fn new(id: impl Into<String>, tier: UserTier) -> Self {
        UserRef { id: id.into(), tier }
    }

    pub fn member(id: impl Into<String>) -> Self {
        Self::new(id, UserTier::Member)
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id, UserTier::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.tier.is_admin()
    }
}
