//! Bookrent client
//!
//! Client library for the Bookrent book rental REST API: a bearer-token HTTP
//! adapter, a tag-invalidated query cache, and the session and view-filter
//! stores a front end renders from.

use std::sync::Arc;

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod views;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use api::{ReqwestTransport, Transport};
use repository::{FileTokenStore, TokenStore};
use routes::{Access, Route};
use services::{Services, Session, ViewFilters};

/// Client state that is wiped when the server ends the session
pub trait StateReset: Send + Sync {
    fn reset(&self);
}

/// Application context shared by every view and command
#[derive(Clone)]
pub struct App {
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
}

impl App {
    /// Build against the configured backend, with the token kept on disk
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config.api)?);
        let tokens = Arc::new(FileTokenStore::new(config.storage.token_path.clone()));
        Ok(Self::with_parts(config, transport, tokens))
    }

    pub fn with_parts(
        config: AppConfig,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let services = Services::new(&config, transport, tokens);
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }

    /// Reset every piece of client state and go to login.
    ///
    /// Same effect as the forced logout on an authorization failure: the
    /// persisted token is cleared first, then session, cache and filters.
    pub async fn reset(&self) -> Route {
        self.services.http.force_logout().await;
        Route::Login
    }

    pub fn session(&self) -> Session {
        self.services.session.snapshot()
    }

    pub fn filters(&self) -> ViewFilters {
        self.services.filters.snapshot()
    }

    /// Check whether the current session may open `route`
    pub fn open(&self, route: &Route) -> Access {
        routes::guard(route, &self.session())
    }
}
