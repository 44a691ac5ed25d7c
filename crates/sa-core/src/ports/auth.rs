use crate::ids::UserId;

/// Resolution state of the auth context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    Loading,
    Authenticated { user_id: UserId },
    Unauthenticated,
}

impl AuthStatus {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Loading)
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Authenticated { user_id } => Some(user_id),
            _ => None,
        }
    }
}

/// Gate for data fetching: nothing is requested while the status is
/// [`AuthStatus::Loading`].
pub trait AuthContextPort: Send + Sync {
    fn status(&self) -> AuthStatus;
}
