//! Session store: authentication status, current user and last error

use tokio::sync::watch;

use crate::{models::User, StateReset};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthStatus {
    /// Nothing checked yet
    #[default]
    Unknown,
    /// Credential check or token bootstrap in progress
    Loading,
    Authenticated,
    Anonymous,
}

/// Snapshot of the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub status: AuthStatus,
    pub user: Option<User>,
    pub error: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    pub fn loading(&self) -> bool {
        self.status == AuthStatus::Loading
    }

    /// True until the session has settled on Authenticated or Anonymous
    pub fn is_pending(&self) -> bool {
        matches!(self.status, AuthStatus::Unknown | AuthStatus::Loading)
    }

    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.user.as_ref().is_some_and(User::is_admin)
    }
}

/// Explicit, injectable session context.
///
/// A `user` is only ever present together with `Authenticated`.
pub struct SessionStore {
    state: watch::Sender<Session>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Session::default());
        Self { state }
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Enter `Loading`, keeping the user of an existing session
    pub fn begin_loading(&self) {
        self.state.send_modify(|session| {
            session.status = AuthStatus::Loading;
            session.error = None;
        });
    }

    pub fn authenticate(&self, user: User) {
        tracing::info!(user_id = user.id, role = %user.role, "Session authenticated");
        self.state.send_replace(Session {
            status: AuthStatus::Authenticated,
            user: Some(user),
            error: None,
        });
    }

    pub fn anonymous(&self) {
        self.state.send_replace(Session {
            status: AuthStatus::Anonymous,
            user: None,
            error: None,
        });
    }

    /// `Anonymous` with a message for the user
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(%message, "Session check failed");
        self.state.send_replace(Session {
            status: AuthStatus::Anonymous,
            user: None,
            error: Some(message),
        });
    }
}

impl StateReset for SessionStore {
    fn reset(&self) {
        tracing::info!("Session reset");
        self.anonymous();
    }
}
