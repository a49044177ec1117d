//! Authentication service: restore, login, register and logout

use std::sync::Arc;

use validator::Validate;

use crate::{
    api::AuthApi,
    error::{AppError, AppResult},
    models::{Credentials, Registration},
    repository::TokenStore,
    routes::Route,
    services::session::{Session, SessionStore},
};

#[derive(Clone)]
pub struct AuthService {
    api: AuthApi,
    session: Arc<SessionStore>,
    tokens: Arc<dyn TokenStore>,
}

impl AuthService {
    pub fn new(api: AuthApi, session: Arc<SessionStore>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            api,
            session,
            tokens,
        }
    }

    /// Bootstrap the session from the persisted token.
    ///
    /// Without a token the session goes straight to `Anonymous` and no request
    /// is made. A token the server refuses is discarded.
    pub async fn restore(&self) -> Session {
        let token = self.tokens.load().await.unwrap_or_else(|e| {
            tracing::warn!("Failed to read session token: {}", e);
            None
        });

        if token.is_none() {
            self.session.anonymous();
            return self.session.snapshot();
        }

        self.session.begin_loading();
        match self.api.me().await {
            Ok(user) => self.session.authenticate(user),
            Err(e) => {
                tracing::info!(kind = %e.kind, "Stored session token rejected: {}", e);
                if let Err(e) = self.tokens.clear().await {
                    tracing::error!("Failed to clear session token: {}", e);
                }
                self.session.anonymous();
            }
        }
        self.session.snapshot()
    }

    /// Log in and return where to go next: `from`, or the book list
    pub async fn login(&self, credentials: &Credentials, from: Option<Route>) -> AppResult<Route> {
        credentials.validate()?;
        self.session.begin_loading();

        let response = match self.api.login(credentials).await {
            Ok(response) => response,
            Err(e) => {
                let message = e
                    .data_str("error")
                    .or_else(|| e.data_str("message"))
                    .unwrap_or("Login failed")
                    .to_string();
                self.session.fail(message);
                return Err(e.into());
            }
        };

        // Token first: the identity refetch below must already carry it.
        if let Err(e) = self.tokens.save(&response.access_token).await {
            self.session.fail("Login failed");
            return Err(e);
        }
        self.api.invalidate_identity();
        self.session.authenticate(response.user);

        Ok(match from {
            Some(Route::Login) | Some(Route::Register) | None => Route::Books,
            Some(route) => route,
        })
    }

    /// Create an account. Success does not log in; the caller is sent to login.
    ///
    /// Any current session ends first, so the outcome is always `Anonymous`
    /// with no persisted token.
    pub async fn register(&self, registration: &Registration) -> AppResult<Route> {
        registration.validate()?;
        self.tokens.clear().await?;
        self.api.invalidate_identity();
        self.session.begin_loading();

        match self.api.register(registration).await {
            Ok(_) => {
                tracing::info!(email = %registration.email, "Account registered");
                self.session.anonymous();
                Ok(Route::Login)
            }
            Err(e) => {
                if let Some(fields) = e.field_errors() {
                    self.session.anonymous();
                    return Err(AppError::Validation(fields));
                }
                let message = e.data_str("message").unwrap_or("Registration failed").to_string();
                self.session.fail(message);
                Err(e.into())
            }
        }
    }

    /// End the session locally. The token is gone before anything else changes.
    pub async fn logout(&self) -> AppResult<()> {
        let cleared = self.tokens.clear().await;
        self.api.invalidate_identity();
        self.session.anonymous();
        tracing::info!("Logged out");
        cleared
    }

    pub fn session(&self) -> Session {
        self.session.snapshot()
    }
}
