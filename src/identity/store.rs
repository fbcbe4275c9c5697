//! Credential store: user records keyed by normalized email.

use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

use super::principal::User;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("a user with email '{0}' already exists")]
    DuplicateEmail(String),
}

/// Lower-cased, trimmed form used as the uniqueness key.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

pub trait CredentialStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> Option<User>;

    /// Insert a new user. Fails if `find_by_email` would have found one; the check
    /// and the insert are atomic with respect to other inserts.
    fn insert(&self, user: User) -> Result<User, StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self { Self::default() }
}

impl CredentialStore for MemoryCredentialStore {
    fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.read().get(&normalize_email(email)).cloned()
    }

    fn insert(&self, mut user: User) -> Result<User, StoreError> {
        let key = normalize_email(&user.email);
        let mut map = self.users.write();
        if map.contains_key(&key) {
            return Err(StoreError::DuplicateEmail(key));
        }
        user.email = key.clone();
        map.insert(key, user.clone());
        Ok(user)
    }

    fn len(&self) -> usize { self.users.read().len() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;
    use std::sync::Arc;

    fn user(id: &str, email: &str) -> User {
        User { id: id.into(), name: "n".into(), email: email.into(), password_hash: "h".into(), role: Role::User }
    }

    #[test]
    fn insert_then_find_case_insensitive() {
        let s = MemoryCredentialStore::new();
        let u = s.insert(user("1", " Ann@X.com ")).unwrap();
        assert_eq!(u.email, "ann@x.com");
        assert_eq!(s.find_by_email("ANN@x.COM").map(|u| u.id), Some("1".to_string()));
        assert!(s.find_by_email("bob@x.com").is_none());
    }

    #[test]
    fn duplicate_email_rejected() {
        let s = MemoryCredentialStore::new();
        s.insert(user("1", "ann@x.com")).unwrap();
        let err = s.insert(user("2", "ANN@x.com")).unwrap_err();
        assert_eq!(err, StoreError::DuplicateEmail("ann@x.com".into()));
        assert_eq!(s.len(), 1);
        assert_eq!(s.find_by_email("ann@x.com").unwrap().id, "1");
    }

    #[test]
    fn concurrent_same_email_at_most_one_wins() {
        let s = Arc::new(MemoryCredentialStore::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let s = s.clone();
                std::thread::spawn(move || s.insert(user(&i.to_string(), "race@x.com")).is_ok())
            })
            .collect();
        let wins = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
        assert_eq!(wins, 1);
        assert_eq!(s.len(), 1);
    }
}
