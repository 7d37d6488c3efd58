use std::sync::{Mutex, PoisonError};

pub const LOGIN_ROUTE: &str = "/login";
pub const UNAUTHORIZED_ROUTE: &str = "/unauthorized";

pub trait Navigator: Send + Sync {
    fn push(&self, route: &str);
    /// Navigates to `route` overwriting the current history entry.
    fn replace(&self, route: &str);
}

/// In-memory history stack.
#[derive(Debug)]
pub struct HistoryNavigator {
    entries: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(vec![initial.into()]),
        }
    }

    pub fn current(&self) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pops the current entry. Returns the entry that becomes current, or
    /// `None` when there is nothing to go back to.
    pub fn back(&self) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() < 2 {
            return None;
        }
        entries.pop();
        entries.last().cloned()
    }
}

impl Navigator for HistoryNavigator {
    fn push(&self, route: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push(route.to_string());
    }

    fn replace(&self, route: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.last_mut() {
            Some(current) => *current = route.to_string(),
            None => entries.push(route.to_string()),
        }
    }
}
