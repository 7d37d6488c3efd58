//! Client-held session state.
//!
//! The portal keeps identity and role in a key-value store that lives as long
//! as the process. Screens never read the store directly: they get a
//! [`SessionContext`] injected and ask it at call time, so a login that
//! happens after a screen was built is still observed.

use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt::{self, Display},
    str::FromStr,
    sync::{Arc, PoisonError, RwLock},
};
use thiserror::Error;

pub const USERNAME_KEY: &str = "username";
pub const ROLE_KEY: &str = "role";
pub const USER_ID_KEY: &str = "userId";
pub const DEPARTMENT_KEY: &str = "department";

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str) -> Option<String>;
    /// Removes every entry and returns how many there were.
    fn clear(&self) -> usize;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key)
    }

    fn clear(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let removed = entries.len();
        entries.clear();
        removed
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Lecturer,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Lecturer => "lecturer",
            Role::Student => "student",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "lecturer" => Ok(Role::Lecturer),
            "student" => Ok(Role::Student),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// What a successful login (password or passkey) hands to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProfile {
    pub username: String,
    pub role: Role,
    pub user_id: String,
    pub department: Option<String>,
}

#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn username(&self) -> Option<String> {
        self.store.get(USERNAME_KEY)
    }

    pub fn user_id(&self) -> Option<String> {
        self.store.get(USER_ID_KEY)
    }

    pub fn department(&self) -> Option<String> {
        self.store.get(DEPARTMENT_KEY)
    }

    /// A stored role that no longer parses counts as no role.
    pub fn role(&self) -> Option<Role> {
        self.store.get(ROLE_KEY)?.parse().ok()
    }

    pub fn is_authenticated(&self) -> bool {
        self.username().is_some() && self.role().is_some()
    }

    pub fn establish(&self, profile: &SessionProfile) {
        self.store.set(USERNAME_KEY, profile.username.clone());
        self.store.set(ROLE_KEY, profile.role.as_str().to_string());
        self.store.set(USER_ID_KEY, profile.user_id.clone());
        match &profile.department {
            Some(department) => self.store.set(DEPARTMENT_KEY, department.clone()),
            None => {
                self.store.remove(DEPARTMENT_KEY);
            }
        }
    }

    pub fn clear(&self) -> usize {
        self.store.clear()
    }
}

#[cfg(test)]
pub(crate) fn student_profile() -> SessionProfile {
    SessionProfile {
        username: "ada".to_string(),
        role: Role::Student,
        user_id: "42".to_string(),
        department: Some("Computer Science".to_string()),
    }
}
