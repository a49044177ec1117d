//! Client state and services

pub mod auth;
pub mod filters;
pub mod session;

use std::sync::Arc;

use crate::{
    api::{AuthApi, BooksApi, HttpClient, Resource, Transport},
    cache::QueryCache,
    config::AppConfig,
    repository::TokenStore,
    StateReset,
};

pub use auth::AuthService;
pub use filters::{FilterStore, ViewFilters};
pub use session::{AuthStatus, Session, SessionStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub books: BooksApi,
    pub session: Arc<SessionStore>,
    pub filters: Arc<FilterStore>,
    pub cache: QueryCache<Resource>,
    pub http: HttpClient,
}

impl Services {
    /// Wire the stores, the cache and the HTTP client together
    pub fn new(
        config: &AppConfig,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let session = Arc::new(SessionStore::new());
        let filters = Arc::new(FilterStore::new());
        let cache = QueryCache::new(config.cache.ttl());

        // Wiped in this order on forced logout, after the token
        let resets: Vec<Arc<dyn StateReset>> = vec![
            session.clone() as Arc<dyn StateReset>,
            Arc::new(cache.clone()) as Arc<dyn StateReset>,
            filters.clone() as Arc<dyn StateReset>,
        ];
        let http = HttpClient::new(transport, tokens.clone(), resets);

        let auth_api = AuthApi::new(http.clone(), cache.clone());
        Self {
            auth: AuthService::new(auth_api, session.clone(), tokens),
            books: BooksApi::new(http.clone(), cache.clone()),
            session,
            filters,
            cache,
            http,
        }
    }
}
