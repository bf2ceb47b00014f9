use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

/// Authenticated request identity, resolved by the transport layer before
/// the core is invoked. The core trusts it and never re-validates
/// credentials.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::User,
        }
    }

    /// Ownership test used uniformly by the services: admins pass, everyone
    /// else must match the resource owner.
    pub fn owns(&self, owner: Option<Uuid>) -> bool {
        self.role == Role::Admin || owner == Some(self.user_id)
    }
}
