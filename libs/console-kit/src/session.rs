use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Authenticated user as returned by the login endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Clone, Debug)]
struct SessionData {
    token: String,
    user: Option<UserInfo>,
}

/// Shared, cloneable handle to the current login.
///
/// Every [`TracedClient`](crate::TracedClient) built from the same session
/// sees token changes immediately.
#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<Option<SessionData>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session pre-seeded with a token (e.g. from configuration).
    pub fn with_token(token: impl Into<String>) -> Self {
        let s = Self::new();
        s.set(token, None);
        s
    }

    pub fn set(&self, token: impl Into<String>, user: Option<UserInfo>) {
        *self.inner.write() = Some(SessionData {
            token: token.into(),
            user,
        });
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().as_ref().map(|d| d.token.clone())
    }

    pub fn user(&self) -> Option<UserInfo> {
        self.inner.read().as_ref().and_then(|d| d.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .read()
            .as_ref()
            .is_some_and(|d| !d.token.is_empty())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("user", &self.user().map(|u| u.email))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = Session::new();
        let b = a.clone();
        assert!(!b.is_authenticated());

        a.set("tok", None);
        assert_eq!(b.token().as_deref(), Some("tok"));

        b.clear();
        assert!(!a.is_authenticated());
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        assert!(!Session::with_token("").is_authenticated());
    }

    #[test]
    fn debug_does_not_leak_token() {
        let s = Session::with_token("secret-token");
        assert!(!format!("{s:?}").contains("secret-token"));
    }
}
