//! Admin allow-list.
//! Identities that may pass `admin_only`.

use std::collections::HashSet;

use crate::config::{load_admin_ids, ConfigError, SecurityConfig};
use crate::event::UserId;

#[derive(Debug, Clone, Default)]
pub struct AdminList {
    ids: HashSet<UserId>,
}

impl AdminList {
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: ids.into_iter().map(UserId).collect(),
        }
    }

    /// Build from the config file plus the environment variable it names.
    pub fn from_config(config: &SecurityConfig) -> Result<Self, ConfigError> {
        let ids = load_admin_ids(config)?;
        tracing::debug!(admins = ids.len(), "Admin allow-list loaded");
        Ok(Self::new(ids))
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.ids.contains(&user)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let admins = AdminList::new([1, 2, 2]);
        assert_eq!(admins.len(), 2);
        assert!(admins.contains(UserId(1)));
        assert!(!admins.contains(UserId(3)));
        assert!(AdminList::default().is_empty());
    }

    #[test]
    fn test_from_config_without_env() {
        let config = SecurityConfig {
            admin_ids: vec![42],
            admin_ids_env: "BOT_GUARD_TEST_UNSET_ADMINS".into(),
        };
        let admins = AdminList::from_config(&config).unwrap();
        assert!(admins.contains(UserId(42)));
        assert_eq!(admins.len(), 1);
    }
}
