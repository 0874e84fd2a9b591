use crate::config::Config;

/// The signed-in user, as far as this crate cares: an opaque id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into() }
    }

    /// Current session from configuration, if a user is set
    pub fn current(config: &Config) -> Option<Self> {
        config
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(Self::new)
    }
}
